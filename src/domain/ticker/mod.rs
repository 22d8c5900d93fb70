//! Ticker domain: 24h price summaries for the home list and the detail page.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod wire;

use crate::query::QueryKey;
use crate::shared::{format_number, format_with_digits, Ticker};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Key of the full ticker list.
pub fn list_key() -> QueryKey {
    QueryKey::new(["ticker-list"])
}

/// Key of one ticker's detail record.
pub fn info_key(ticker: &Ticker) -> QueryKey {
    QueryKey::new(["ticker-info"]).with(ticker)
}

/// Direction of the price over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Same,
}

impl Trend {
    pub fn from_diff(diff: f64) -> Self {
        if diff > 0.0 {
            Trend::Increase
        } else if diff < 0.0 {
            Trend::Decrease
        } else {
            Trend::Same
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increase => "increase",
            Trend::Decrease => "decrease",
            Trend::Same => "same",
        }
    }
}

/// Ordering of the home list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Quote volume, largest first.
    #[default]
    Volume,
    /// Symbol, ascending.
    Name,
}

/// One ticker's 24h window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub symbol: Ticker,
    pub first: f64,
    pub last: f64,
    pub high: f64,
    pub low: f64,
    pub quote_volume: f64,
    pub target_volume: f64,
}

/// The detail page reads the same record.
pub type TickerDetail = TickerSummary;

impl TickerSummary {
    pub fn diff(&self) -> f64 {
        self.last - self.first
    }

    /// Percentage change from `first`. `None` when `first` is zero.
    pub fn rate(&self) -> Option<f64> {
        if self.first == 0.0 {
            return None;
        }
        Some(self.diff() * 100.0 / self.first)
    }

    pub fn trend(&self) -> Trend {
        Trend::from_diff(self.diff())
    }

    // ── Display ──────────────────────────────────────────────────────────

    pub fn formatted_last(&self) -> String {
        format_number(self.last)
    }

    /// `-10.00%`, or `-` without a base price.
    pub fn formatted_rate(&self) -> String {
        match self.rate() {
            Some(rate) => format!("{rate:.2}%"),
            None => "-".to_string(),
        }
    }

    pub fn formatted_diff(&self) -> String {
        format!("{:.2}", self.diff())
    }

    pub fn formatted_quote_volume(&self) -> String {
        format_with_digits(self.quote_volume, 0)
    }

    pub fn formatted_target_volume(&self) -> String {
        format_with_digits(self.target_volume, 0)
    }
}

/// Sort in place. Both orders are stable.
pub fn sort_tickers(list: &mut [TickerSummary], by: SortBy) {
    list.sort_by(|a, b| compare(a, b, by));
}

/// Comparator for [`SortBy`], for callers sorting their own collections.
pub fn compare(a: &TickerSummary, b: &TickerSummary, by: SortBy) -> Ordering {
    match by {
        SortBy::Volume => b.quote_volume.total_cmp(&a.quote_volume),
        SortBy::Name => a.symbol.cmp(&b.symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(symbol: &str, first: f64, last: f64, quote_volume: f64) -> TickerSummary {
        TickerSummary {
            symbol: Ticker::new(symbol),
            first,
            last,
            high: first.max(last),
            low: first.min(last),
            quote_volume,
            target_volume: 1.0,
        }
    }

    #[test]
    fn test_derived_fields() {
        let t = summary("btc", 100.0, 90.0, 0.0);
        assert_eq!(t.diff(), -10.0);
        assert_eq!(t.rate(), Some(-10.0));
        assert_eq!(t.trend(), Trend::Decrease);
        assert_eq!(t.formatted_rate(), "-10.00%");
        assert_eq!(t.formatted_diff(), "-10.00");

        assert_eq!(summary("eth", 50.0, 50.0, 0.0).trend(), Trend::Same);
        assert_eq!(summary("xrp", 1.0, 2.0, 0.0).trend(), Trend::Increase);
    }

    #[test]
    fn test_rate_without_base_price() {
        let t = summary("new", 0.0, 5.0, 0.0);
        assert_eq!(t.rate(), None);
        assert_eq!(t.formatted_rate(), "-");
    }

    #[test]
    fn test_volume_sort_is_stable_descending() {
        let mut list = vec![
            summary("aaa", 1.0, 1.0, 10.0),
            summary("bbb", 1.0, 1.0, 30.0),
            summary("ccc", 1.0, 1.0, 10.0),
            summary("ddd", 1.0, 1.0, 20.0),
        ];
        sort_tickers(&mut list, SortBy::Volume);
        let order: Vec<&str> = list.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(order, vec!["BBB", "DDD", "AAA", "CCC"]);
    }

    #[test]
    fn test_name_sort_ascending() {
        let mut list = vec![
            summary("eth", 1.0, 1.0, 30.0),
            summary("btc", 1.0, 1.0, 10.0),
            summary("ada", 1.0, 1.0, 20.0),
        ];
        sort_tickers(&mut list, SortBy::Name);
        let order: Vec<&str> = list.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(order, vec!["ADA", "BTC", "ETH"]);
        assert_eq!(compare(&list[0], &list[1], SortBy::Name), Ordering::Less);
    }

    #[test]
    fn test_keys() {
        assert_eq!(list_key().to_string(), "[ticker-list]");
        assert_eq!(info_key(&Ticker::new("btc")).to_string(), "[ticker-info, BTC]");
    }
}
