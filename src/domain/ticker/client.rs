//! Tickers sub-client: the home list and per-ticker detail.
//!
//! Records are validated once, when a response arrives; the cache holds the
//! converted summaries and selectors only sort or pick from them.

use super::{info_key, list_key, sort_tickers, SortBy, TickerDetail, TickerSummary};
use crate::client::TickerboardClient;
use crate::error::QueryError;
use crate::query::{QueryObserver, QueryOptions};
use crate::shared::Ticker;

/// Sub-client for ticker summaries.
pub struct Tickers<'a> {
    pub(crate) client: &'a TickerboardClient,
}

impl<'a> Tickers<'a> {
    /// The ticker list, sorted by `sort_by` on every read.
    ///
    /// Every sort order shares the one `["ticker-list"]` entry.
    pub fn list_options(&self, sort_by: SortBy) -> QueryOptions<Vec<TickerSummary>> {
        let http = self.client.http.clone();
        QueryOptions::new(list_key(), move || {
            let http = http.clone();
            async move {
                http.get_tickers()
                    .await
                    .map(|resp| resp.summaries())
                    .map_err(QueryError::from)
            }
        })
        .select(move |list: &Vec<TickerSummary>| {
            let mut list = list.clone();
            sort_tickers(&mut list, sort_by);
            list
        })
    }

    pub async fn list(&self, sort_by: SortBy) -> QueryObserver<Vec<TickerSummary>, Vec<TickerSummary>> {
        self.client.queries.observe(self.list_options(sort_by)).await
    }

    /// One ticker's record; the view is the first valid record of the response.
    pub fn info_options(&self, ticker: &Ticker) -> QueryOptions<Vec<TickerSummary>, Option<TickerDetail>> {
        let http = self.client.http.clone();
        let symbol = ticker.clone();
        QueryOptions::new(info_key(ticker), move || {
            let http = http.clone();
            let symbol = symbol.clone();
            async move {
                http.get_ticker(&symbol)
                    .await
                    .map(|resp| resp.summaries())
                    .map_err(QueryError::from)
            }
        })
        .select(|list: &Vec<TickerSummary>| list.first().cloned())
    }

    pub async fn info(&self, ticker: &Ticker) -> QueryObserver<Vec<TickerSummary>, Option<TickerDetail>> {
        self.client.queries.observe(self.info_options(ticker)).await
    }
}
