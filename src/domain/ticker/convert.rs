//! Conversions from wire types to domain types for tickers.

use super::wire::{TickerResponse, TickersResponse};
use super::TickerSummary;
use crate::error::ValidationError;
use crate::shared::Ticker;

impl TryFrom<&TickerResponse> for TickerSummary {
    type Error = ValidationError;

    fn try_from(t: &TickerResponse) -> Result<Self, Self::Error> {
        if t.target_currency.trim().is_empty() {
            return Err(ValidationError::Missing("target_currency"));
        }
        Ok(Self {
            symbol: Ticker::new(&t.target_currency),
            first: t.first.parse("first")?,
            last: t.last.parse("last")?,
            high: t.high.parse("high")?,
            low: t.low.parse("low")?,
            quote_volume: t.quote_volume.parse("quote_volume")?,
            target_volume: t.target_volume.parse("target_volume")?,
        })
    }
}

impl TickersResponse {
    /// Convert every record, skipping (and logging) the ones that fail.
    pub fn summaries(&self) -> Vec<TickerSummary> {
        self.tickers
            .iter()
            .filter_map(|t| match TickerSummary::try_from(t) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!(ticker = %t.target_currency, error = %e, "Skipping ticker record");
                    None
                }
            })
            .collect()
    }
}
