//! Saved sub-client: read the saved set, save and remove tickers.

use super::{list_key, SaveAction, SavedTickerSet};
use crate::client::TickerboardClient;
use crate::error::{MutationError, QueryError};
use crate::query::{MutationOptions, QueryObserver, QueryOptions};
use crate::shared::Ticker;

/// Sub-client for the user's saved tickers.
pub struct Saved<'a> {
    pub(crate) client: &'a TickerboardClient,
}

impl<'a> Saved<'a> {
    pub fn options(&self) -> QueryOptions<Vec<Ticker>, SavedTickerSet> {
        let http = self.client.http.clone();
        QueryOptions::new(list_key(), move || {
            let http = http.clone();
            async move { http.get_saved_tickers().await.map_err(QueryError::from) }
        })
        .select(|list: &Vec<Ticker>| SavedTickerSet::from(list.as_slice()))
    }

    pub async fn observe(&self) -> QueryObserver<Vec<Ticker>, SavedTickerSet> {
        self.client.queries.observe(self.options()).await
    }

    /// Mutation for `action` on `ticker`, invalidating the saved list.
    pub fn mutation(&self, action: SaveAction, ticker: &Ticker) -> MutationOptions<()> {
        let http = self.client.http.clone();
        let symbol = ticker.clone();
        MutationOptions::new(format!("{} {}", action.as_str(), ticker), move || {
            let http = http.clone();
            let symbol = symbol.clone();
            async move {
                match action {
                    SaveAction::Save => http.save_ticker(&symbol).await,
                    SaveAction::Remove => http.remove_ticker(&symbol).await,
                }
            }
        })
        .invalidates(list_key())
    }

    pub async fn save(&self, ticker: &Ticker) -> Result<(), MutationError> {
        let mutation = self.mutation(SaveAction::Save, ticker);
        self.client.mutations().execute(&mutation).await
    }

    pub async fn remove(&self, ticker: &Ticker) -> Result<(), MutationError> {
        let mutation = self.mutation(SaveAction::Remove, ticker);
        self.client.mutations().execute(&mutation).await
    }

    /// What the save button does: remove when `is_saved`, save otherwise.
    pub async fn toggle(&self, ticker: &Ticker, is_saved: bool) -> Result<SaveAction, MutationError> {
        let action = SaveAction::for_state(is_saved);
        let mutation = self.mutation(action, ticker);
        self.client.mutations().execute(&mutation).await?;
        Ok(action)
    }
}
