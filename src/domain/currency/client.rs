//! Currencies sub-client.

use super::wire::CurrenciesResponse;
use super::{list_key, CurrencyMap};
use crate::client::TickerboardClient;
use crate::error::QueryError;
use crate::query::{QueryObserver, QueryOptions};

/// Sub-client for currency names.
pub struct Currencies<'a> {
    pub(crate) client: &'a TickerboardClient,
}

impl<'a> Currencies<'a> {
    /// The currency list viewed as a symbol → currency map.
    pub fn options(&self) -> QueryOptions<CurrenciesResponse, CurrencyMap> {
        let http = self.client.http.clone();
        QueryOptions::new(list_key(), move || {
            let http = http.clone();
            async move { http.get_currencies().await.map_err(QueryError::from) }
        })
        .select(CurrenciesResponse::to_map)
    }

    pub async fn observe(&self) -> QueryObserver<CurrenciesResponse, CurrencyMap> {
        self.client.queries.observe(self.options()).await
    }
}
