//! Low-level HTTP client: `TickerboardHttp`.
//!
//! One method per API endpoint. Returns wire types; the domain slices turn
//! them into query options and derived views.

use crate::domain::candle::wire::{ChartRequest, ChartResponse};
use crate::domain::candle::Interval;
use crate::domain::currency::wire::CurrenciesResponse;
use crate::domain::ticker::wire::TickersResponse;
use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::shared::Ticker;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

/// Low-level HTTP client for the dashboard REST API.
#[derive(Clone)]
pub struct TickerboardHttp {
    base_url: String,
    client: Client,
    /// Policy for the read endpoints. Writes always make a single attempt.
    read_retry: RetryPolicy,
}

impl TickerboardHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
            read_retry: RetryPolicy::None,
        })
    }

    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Tickers ──────────────────────────────────────────────────────────

    /// `GET /api/tickers`
    pub async fn get_tickers(&self) -> Result<TickersResponse, HttpError> {
        let url = format!("{}/api/tickers", self.base_url);
        self.get(&url).await
    }

    /// `GET /api/tickers/{ticker}`
    pub async fn get_ticker(&self, ticker: &Ticker) -> Result<TickersResponse, HttpError> {
        let url = self.ticker_url("api/tickers", ticker);
        self.get(&url).await
    }

    // ── Currencies ───────────────────────────────────────────────────────

    /// `GET /api/currencies`
    pub async fn get_currencies(&self) -> Result<CurrenciesResponse, HttpError> {
        let url = format!("{}/api/currencies", self.base_url);
        self.get(&url).await
    }

    // ── Charts ───────────────────────────────────────────────────────────

    /// `POST /api/chart/{ticker}` with `{"interval": ...}`. A read despite
    /// the verb, so it follows the read retry policy.
    pub async fn get_chart(&self, ticker: &Ticker, interval: Interval) -> Result<ChartResponse, HttpError> {
        let url = self.ticker_url("api/chart", ticker);
        let body = ChartRequest { interval };
        let text = self
            .send(Method::POST, &url, Some(&body), self.read_retry.clone())
            .await?;
        decode(&url, &text)
    }

    // ── Saved tickers ────────────────────────────────────────────────────

    /// `GET /api/saved-tickers`
    pub async fn get_saved_tickers(&self) -> Result<Vec<Ticker>, HttpError> {
        let url = format!("{}/api/saved-tickers", self.base_url);
        self.get(&url).await
    }

    /// `POST /api/saved-tickers/{ticker}`
    pub async fn save_ticker(&self, ticker: &Ticker) -> Result<(), HttpError> {
        let url = self.ticker_url("api/saved-tickers", ticker);
        self.send(Method::POST, &url, None::<&()>, RetryPolicy::None)
            .await
            .map(drop)
    }

    /// `DELETE /api/saved-tickers/{ticker}`
    pub async fn remove_ticker(&self, ticker: &Ticker) -> Result<(), HttpError> {
        let url = self.ticker_url("api/saved-tickers", ticker);
        self.send(Method::DELETE, &url, None::<&()>, RetryPolicy::None)
            .await
            .map(drop)
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    fn ticker_url(&self, path: &str, ticker: &Ticker) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            path,
            urlencoding::encode(ticker.as_str())
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let text = self
            .send(Method::GET, url, None::<&()>, self.read_retry.clone())
            .await?;
        decode(url, &text)
    }

    /// Run the request under `retry` and return the response body.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<String, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(&method, url, body).await;
        };

        let mut last_error = None;
        for attempt in 0..=config.max_retries {
            match self.do_request(&method, url, body).await {
                Ok(text) => return Ok(text),
                Err(e) if config.is_retryable(&e) && attempt < config.max_retries => {
                    let delay = match &e {
                        HttpError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => std::time::Duration::from_millis(*ms),
                        _ => config.delay_for_attempt(attempt),
                    };
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying {} {}",
                        method,
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<B: Serialize>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<String, HttpError> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.text().await?);
        }

        let retry_after_ms = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            404 => Err(HttpError::NotFound(body_text)),
            429 => Err(HttpError::RateLimited { retry_after_ms }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, HttpError> {
    serde_json::from_str(text).map_err(|e| HttpError::Decode(format!("{url}: {e}")))
}
