//! Wire types for candle chart requests and responses (REST).

use super::Interval;
use crate::shared::{RawNumber, RawTimestamp};
use serde::{Deserialize, Serialize};

/// One OHLC sample as the chart endpoint sends it.
///
/// Every field is optional and accepts any JSON value, so a single
/// malformed sample is rejected during normalization instead of failing the
/// whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSample {
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub open: Option<RawNumber>,
    #[serde(default)]
    pub high: Option<RawNumber>,
    #[serde(default)]
    pub low: Option<RawNumber>,
    #[serde(default)]
    pub close: Option<RawNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_volume: Option<RawNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<RawNumber>,
}

impl CandleSample {
    /// A sample carrying only the fields the line chart reads.
    pub fn new(timestamp: impl Into<RawTimestamp>, close: impl Into<RawNumber>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            open: None,
            high: None,
            low: None,
            close: Some(close.into()),
            target_volume: None,
            quote_volume: None,
        }
    }
}

/// REST response for `POST /api/chart/{ticker}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub chart: Vec<CandleSample>,
}

/// Request body for `POST /api/chart/{ticker}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub interval: Interval,
}
