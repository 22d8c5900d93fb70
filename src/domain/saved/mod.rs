//! Saved tickers: the user's starred symbols.
//!
//! The set is never edited locally. Saving or removing a ticker is a
//! mutation that invalidates [`list_key`], and the refetched list is the only
//! source of truth.

#[cfg(feature = "http")]
pub mod client;

use crate::query::QueryKey;
use crate::shared::Ticker;
use std::collections::HashSet;

/// Key of the saved-ticker list. Save and remove invalidate it.
pub fn list_key() -> QueryKey {
    QueryKey::new(["saved-ticker-list"])
}

/// Set view over the saved-ticker list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedTickerSet(HashSet<Ticker>);

impl SavedTickerSet {
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.0.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        self.0.iter()
    }
}

impl From<&[Ticker]> for SavedTickerSet {
    fn from(list: &[Ticker]) -> Self {
        Self(list.iter().cloned().collect())
    }
}

impl FromIterator<Ticker> for SavedTickerSet {
    fn from_iter<I: IntoIterator<Item = Ticker>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which write a save button press performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Save,
    Remove,
}

impl SaveAction {
    /// Saved tickers are removed, others are saved.
    pub fn for_state(is_saved: bool) -> Self {
        if is_saved {
            SaveAction::Remove
        } else {
            SaveAction::Save
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SaveAction::Save => "save",
            SaveAction::Remove => "remove",
        }
    }
}
