//! Wire types for ticker responses (REST).

use crate::shared::{RawNumber, RawTimestamp};
use serde::{Deserialize, Serialize};

/// One 24h ticker record as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerResponse {
    /// Lower-case symbol, e.g. `btc`.
    pub target_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    pub first: RawNumber,
    pub last: RawNumber,
    pub high: RawNumber,
    pub low: RawNumber,
    pub quote_volume: RawNumber,
    pub target_volume: RawNumber,
}

/// REST response for `GET /api/tickers` and `GET /api/tickers/{ticker}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickersResponse {
    #[serde(default)]
    pub tickers: Vec<TickerResponse>,
}
