//! Currency domain: display names for ticker symbols.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use crate::query::QueryKey;
use crate::shared::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wire::{CurrenciesResponse, CurrencyResponse};

/// Key of the currency list.
pub fn list_key() -> QueryKey {
    QueryKey::new(["currency-list"])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: Ticker,
    pub name: String,
}

impl From<&CurrencyResponse> for Currency {
    fn from(c: &CurrencyResponse) -> Self {
        Self {
            symbol: Ticker::new(&c.symbol),
            name: c.name.clone(),
        }
    }
}

/// Symbol → currency. A symbol listed twice keeps its last entry.
pub type CurrencyMap = HashMap<Ticker, Currency>;

impl CurrenciesResponse {
    pub fn to_map(&self) -> CurrencyMap {
        self.currencies
            .iter()
            .map(|c| {
                let currency = Currency::from(c);
                (currency.symbol.clone(), currency)
            })
            .collect()
    }
}
