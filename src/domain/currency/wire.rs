//! Wire types for currency responses (REST).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyResponse {
    pub symbol: String,
    pub name: String,
}

/// REST response for `GET /api/currencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrenciesResponse {
    #[serde(default)]
    pub currencies: Vec<CurrencyResponse>,
}
