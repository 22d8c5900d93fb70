//! High-level client: `TickerboardClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared query client, and accessor
//! methods.

use crate::domain::candle::client::Charts;
use crate::domain::currency::client::Currencies;
use crate::domain::saved::client::Saved;
use crate::domain::ticker::client::Tickers;
use crate::domain::ticker::SortBy;
use crate::error::{MutationError, QueryError, SdkError};
use crate::http::{RetryPolicy, TickerboardHttp};
use crate::query::{MutationExecutor, MutationNotifier, QueryClient, QueryConfig};

use futures_util::future::join;
use std::rc::Rc;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::domain::candle::client::Charts as ChartsClient;
pub use crate::domain::currency::client::Currencies as CurrenciesClient;
pub use crate::domain::saved::client::Saved as SavedClient;
pub use crate::domain::ticker::client::Tickers as TickersClient;

/// The primary entry point.
///
/// One client per session. Clones share the HTTP connection pool and the
/// query cache.
#[derive(Clone)]
pub struct TickerboardClient {
    pub(crate) http: TickerboardHttp,
    pub(crate) queries: QueryClient,
    /// Called with every failed mutation (the dashboard shows an alert).
    pub(crate) notifier: Option<MutationNotifier>,
}

impl TickerboardClient {
    pub fn builder() -> TickerboardClientBuilder {
        TickerboardClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn tickers(&self) -> Tickers<'_> {
        Tickers { client: self }
    }

    pub fn currencies(&self) -> Currencies<'_> {
        Currencies { client: self }
    }

    pub fn charts(&self) -> Charts<'_> {
        Charts { client: self }
    }

    pub fn saved(&self) -> Saved<'_> {
        Saved { client: self }
    }

    // ── Shared state ─────────────────────────────────────────────────────

    pub fn http(&self) -> &TickerboardHttp {
        &self.http
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn mutations(&self) -> MutationExecutor {
        let executor = MutationExecutor::new(self.queries.clone());
        match &self.notifier {
            Some(notify) => executor.with_notifier(notify.clone()),
            None => executor,
        }
    }

    /// Warm the cache for the home page: the ticker list (default sort) and
    /// the currency list, fetched concurrently.
    pub async fn prefetch_home(&self) -> Result<(), QueryError> {
        let tickers = self.tickers().list_options(SortBy::default());
        let currencies = self.currencies().options();
        let (a, b) = join(
            self.queries.prefetch(&tickers),
            self.queries.prefetch(&currencies),
        )
        .await;
        a.and(b)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct TickerboardClientBuilder {
    base_url: String,
    query_config: QueryConfig,
    read_retry: RetryPolicy,
    notifier: Option<MutationNotifier>,
}

impl Default for TickerboardClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            query_config: QueryConfig::default(),
            read_retry: RetryPolicy::None,
            notifier: None,
        }
    }
}

impl TickerboardClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// How long fetched data counts as fresh.
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.query_config.stale_time = stale_time;
        self
    }

    /// How long unobserved entries are kept before garbage collection.
    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.query_config.gc_time = gc_time;
        self
    }

    /// Retry policy for read endpoints. Writes never retry.
    pub fn read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    pub fn on_mutation_error(mut self, notify: impl Fn(&MutationError) + 'static) -> Self {
        self.notifier = Some(Rc::new(notify));
        self
    }

    pub fn build(self) -> Result<TickerboardClient, SdkError> {
        tracing::debug!(base_url = %self.base_url, "Building tickerboard client");
        Ok(TickerboardClient {
            http: TickerboardHttp::new(&self.base_url)?.with_read_retry(self.read_retry),
            queries: QueryClient::new(self.query_config),
            notifier: self.notifier,
        })
    }
}
