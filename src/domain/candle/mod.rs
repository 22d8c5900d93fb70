//! Candle chart domain: intervals, chart samples and the chart session.

#[cfg(feature = "http")]
pub mod client;
pub mod session;
pub mod wire;

use crate::error::ValidationError;
use crate::query::QueryKey;
use crate::shared::Ticker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use session::{ChartOptionsFn, ChartSession, LoadOutcome};

/// Key of one ticker's chart at one interval.
pub fn chart_key(ticker: &Ticker, interval: Interval) -> QueryKey {
    QueryKey::new(["candle-chart"]).with(ticker).with(interval.as_str())
}

/// Candle width. The first entry of [`Interval::ALL`] is the default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Interval {
    #[default]
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "6h")]
    Hour6,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl Interval {
    /// Every interval, in selector order.
    pub const ALL: [Interval; 11] = [
        Interval::Minute1,
        Interval::Minute3,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Hour1,
        Interval::Hour2,
        Interval::Hour4,
        Interval::Hour6,
        Interval::Day1,
        Interval::Week1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute3 => "3m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Hour6 => "6h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1w",
        }
    }

    /// Initial interval from an optional `?interval=` query parameter.
    /// Missing or unknown values fall back to the default.
    pub fn from_query(param: Option<&str>) -> Self {
        match param.map(str::parse::<Interval>) {
            Some(Ok(interval)) => interval,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Ignoring interval parameter");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| ValidationError::Interval(s.to_string()))
    }
}
