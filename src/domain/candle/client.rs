//! Charts sub-client: candle chart queries and chart sessions.

use super::session::{ChartOptionsFn, ChartSession};
use super::wire::{CandleSample, ChartResponse};
use super::{chart_key, Interval};
use crate::chart::ChartRenderer;
use crate::client::TickerboardClient;
use crate::error::QueryError;
use crate::http::TickerboardHttp;
use crate::query::{QueryObserver, QueryOptions};
use crate::shared::Ticker;
use std::rc::Rc;

/// Sub-client for candle charts.
pub struct Charts<'a> {
    pub(crate) client: &'a TickerboardClient,
}

impl<'a> Charts<'a> {
    /// Query for `ticker`'s samples at `interval`, viewed as the raw sample list.
    pub fn options(&self, ticker: &Ticker, interval: Interval) -> QueryOptions<ChartResponse, Vec<CandleSample>> {
        chart_options(&self.client.http, ticker, interval)
    }

    pub async fn observe(
        &self,
        ticker: &Ticker,
        interval: Interval,
    ) -> QueryObserver<ChartResponse, Vec<CandleSample>> {
        self.client.queries.observe(self.options(ticker, interval)).await
    }

    /// A chart session for `ticker`, starting at `interval`, drawing with
    /// `renderer`.
    pub fn session<R: ChartRenderer>(&self, ticker: Ticker, interval: Interval, renderer: R) -> ChartSession<R> {
        let http = self.client.http.clone();
        let options_for: ChartOptionsFn =
            Rc::new(move |ticker: &Ticker, interval: Interval| chart_options(&http, ticker, interval));
        ChartSession::new(
            self.client.queries.clone(),
            options_for,
            ticker,
            interval,
            renderer,
        )
    }
}

fn chart_options(
    http: &TickerboardHttp,
    ticker: &Ticker,
    interval: Interval,
) -> QueryOptions<ChartResponse, Vec<CandleSample>> {
    let http = http.clone();
    let symbol = ticker.clone();
    QueryOptions::new(chart_key(ticker, interval), move || {
        let http = http.clone();
        let symbol = symbol.clone();
        async move {
            http.get_chart(&symbol, interval)
                .await
                .map_err(QueryError::from)
        }
    })
    .select(|resp: &ChartResponse| resp.chart.clone())
}
