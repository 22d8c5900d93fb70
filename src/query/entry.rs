//! Cache entry lifecycle state.

use crate::error::QueryError;
use chrono::{DateTime, Utc};
use futures_util::future::{LocalBoxFuture, Shared};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Opaque, type-erased payload of a successful fetch.
///
/// Entries never hand out mutable access; observers downcast and project.
pub type Payload = Rc<dyn Any>;

/// A fetch in progress, shared by every observer of the key.
pub(crate) type InFlight = Shared<LocalBoxFuture<'static, Result<(), QueryError>>>;

/// Lifecycle of one remote read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Entry exists but nothing was ever requested.
    #[default]
    Idle,
    /// A fetch is in flight. Prior data, if any, is still served.
    Loading,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the cache knows about one key.
#[derive(Clone, Default)]
pub struct CacheEntry {
    pub status: QueryStatus,
    pub data: Option<Payload>,
    pub error: Option<QueryError>,
    /// Time of the last successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub subscriber_count: usize,
    /// Tag of the most recently issued fetch or write. Tags come from one
    /// counter per cache and are never reused, even after `remove`/`clear`.
    /// Completions carrying any other tag are discarded.
    pub(crate) generation: u64,
    pub(crate) in_flight: Option<InFlight>,
    /// Invalidated while `in_flight` was pending: that fetch predates the
    /// invalidation, so its result must not clear `is_stale`.
    pub(crate) invalidated_in_flight: bool,
    pub(crate) unobserved_since: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An entry seeded with a successful payload, fetched now.
    pub fn with_data<T: 'static>(data: T) -> Self {
        Self {
            status: QueryStatus::Success,
            data: Some(Rc::new(data)),
            fetched_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Stale either by invalidation or by age.
    pub fn is_stale_at(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
        if self.is_stale {
            return true;
        }
        match self.fetched_at {
            Some(fetched_at) => match (now - fetched_at).to_std() {
                Ok(age) => age >= stale_time,
                // fetched "in the future" (clock skew): treat as fresh
                Err(_) => false,
            },
            None => true,
        }
    }

    /// True when an observer arriving now should issue a fetch.
    pub(crate) fn needs_fetch(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.data.is_none() || self.is_stale_at(now, stale_time)
    }

    /// Comparable snapshot of the public lifecycle fields. Payloads are
    /// compared by identity.
    pub fn state(&self) -> EntryState {
        EntryState {
            status: self.status,
            data_ptr: self.data.as_ref().map(|d| Rc::as_ptr(d) as *const () as usize),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            is_stale: self.is_stale,
            subscriber_count: self.subscriber_count,
            generation: self.generation,
            is_fetching: self.is_fetching(),
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("fetched_at", &self.fetched_at)
            .field("is_stale", &self.is_stale)
            .field("subscriber_count", &self.subscriber_count)
            .field("generation", &self.generation)
            .field("is_fetching", &self.is_fetching())
            .finish()
    }
}

/// Value snapshot of a [`CacheEntry`], used to assert that an operation left
/// the cache untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    pub status: QueryStatus,
    pub data_ptr: Option<usize>,
    pub error: Option<QueryError>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub subscriber_count: usize,
    pub generation: u64,
    pub is_fetching: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry_needs_fetch() {
        let entry = CacheEntry::new();
        assert_eq!(entry.status, QueryStatus::Idle);
        assert!(entry.needs_fetch(Utc::now(), Duration::from_secs(60)));
    }

    #[test]
    fn test_fresh_data_does_not_need_fetch() {
        let entry = CacheEntry::with_data(vec![1, 2, 3]);
        assert!(!entry.needs_fetch(Utc::now(), Duration::from_secs(60)));
    }

    #[test]
    fn test_invalidated_data_needs_fetch_but_keeps_data() {
        let mut entry = CacheEntry::with_data(7u32);
        entry.is_stale = true;
        assert!(entry.needs_fetch(Utc::now(), Duration::from_secs(60)));
        assert!(entry.data.is_some());
    }

    #[test]
    fn test_aged_data_is_stale() {
        let mut entry = CacheEntry::with_data(7u32);
        let fetched = entry.fetched_at.unwrap();
        entry.fetched_at = Some(fetched - chrono::Duration::seconds(120));
        assert!(entry.is_stale_at(Utc::now(), Duration::from_secs(60)));
        assert!(!entry.is_stale_at(Utc::now(), Duration::from_secs(600)));
    }

    #[test]
    fn test_zero_stale_time_is_always_stale() {
        let entry = CacheEntry::with_data(7u32);
        assert!(entry.is_stale_at(Utc::now(), Duration::ZERO));
    }

    #[test]
    fn test_state_compares_payload_identity() {
        let a = CacheEntry::with_data(1u8);
        let b = a.clone();
        assert_eq!(a.state(), b.state());

        let mut c = a.clone();
        c.data = Some(Rc::new(1u8));
        assert_ne!(a.state(), c.state());
    }
}
