//! Ticker symbols, loosely-typed backend values and number formatting.
//!
//! `Ticker` serializes as a plain string, so wire types use it directly.
//! `RawNumber` and `RawTimestamp` accept whatever shape the backend sends and
//! are validated later, when converting into domain types.

pub mod fmt;
pub mod raw;

pub use fmt::{format_number, format_with_digits};
pub use raw::{RawNumber, RawTimestamp};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── Ticker ──────────────────────────────────────────────────────────────────

/// Newtype for ticker symbols (e.g. `"BTC"`).
///
/// Always stored upper-case: the backend reports `target_currency` in lower
/// case while routes, saved lists and the currency map use upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Ticker::new(s))
    }
}

impl Serialize for Ticker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Ticker::new(s))
    }
}
