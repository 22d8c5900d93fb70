//! The key-addressed cache: one [`CacheEntry`] per structurally distinct key.
//!
//! The cache is plain synchronous state. Fetch orchestration lives in
//! [`QueryClient`](super::QueryClient), which is the only writer besides
//! explicit `put`/`invalidate` calls.

use super::entry::{CacheEntry, EntryState, QueryStatus};
use super::key::QueryKey;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

/// State-change notification delivered to listeners of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub is_stale: bool,
}

/// Callback invoked after a key's entry transitions.
pub type Listener = Rc<dyn Fn(&QueryEvent)>;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    listeners: HashMap<QueryKey, Vec<(ListenerId, Listener)>>,
    next_listener: u64,
    last_generation: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Replace the entry for `key` wholesale. Any fetch in flight for the
    /// previous entry is orphaned and its response will be discarded.
    pub fn put(&mut self, key: QueryKey, mut entry: CacheEntry) {
        if let Some(previous) = self.entries.get(&key) {
            entry.subscriber_count = previous.subscriber_count;
        }
        entry.generation = self.next_generation();
        entry.in_flight = None;
        entry.invalidated_in_flight = false;
        self.entries.insert(key, entry);
    }

    /// Mark every existing entry in `keys` stale. Returns the subset that
    /// currently has subscribers and therefore needs an immediate refetch.
    ///
    /// Keys without an entry are ignored. Data is never removed.
    pub fn invalidate(&mut self, keys: &[QueryKey]) -> Vec<QueryKey> {
        let mut active = Vec::new();
        for key in keys {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.is_stale = true;
                entry.invalidated_in_flight = entry.in_flight.is_some();
                tracing::debug!(key = %key, subscribers = entry.subscriber_count, "Invalidated query");
                if entry.subscriber_count > 0 {
                    active.push(key.clone());
                }
            }
        }
        active
    }

    /// Invalidate every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &QueryKey) -> Vec<QueryKey> {
        let matching: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        self.invalidate(&matching)
    }

    pub fn remove(&mut self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.entries.keys()
    }

    /// Ordered snapshot of every entry's state.
    pub fn snapshot(&self) -> BTreeMap<QueryKey, EntryState> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.state()))
            .collect()
    }

    // ── Crate-internal lifecycle ─────────────────────────────────────────

    /// A fresh fetch tag, unique for the lifetime of this cache.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    pub(crate) fn get_mut(&mut self, key: &QueryKey) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    pub(crate) fn entry_mut(&mut self, key: &QueryKey) -> &mut CacheEntry {
        self.entries.entry(key.clone()).or_default()
    }

    pub(crate) fn subscribe(&mut self, key: &QueryKey) {
        let entry = self.entry_mut(key);
        entry.subscriber_count += 1;
        entry.unobserved_since = None;
    }

    pub(crate) fn unsubscribe(&mut self, key: &QueryKey, now: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
            if entry.subscriber_count == 0 {
                entry.unobserved_since = Some(now);
            }
        }
    }

    pub(crate) fn add_listener(&mut self, key: &QueryKey, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners
            .entry(key.clone())
            .or_default()
            .push((id, listener));
        id
    }

    pub(crate) fn remove_listener(&mut self, key: &QueryKey, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(key) {
            list.retain(|(lid, _)| *lid != id);
            if list.is_empty() {
                self.listeners.remove(key);
            }
        }
    }

    /// Listeners for `key` plus the event describing its current state.
    /// Callers must release the cache borrow before invoking them.
    pub(crate) fn pending_notification(&self, key: &QueryKey) -> Option<(QueryEvent, Vec<Listener>)> {
        let entry = self.entries.get(key)?;
        let listeners: Vec<Listener> = self
            .listeners
            .get(key)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        if listeners.is_empty() {
            return None;
        }
        let event = QueryEvent {
            key: key.clone(),
            status: entry.status,
            is_stale: entry.is_stale,
        };
        Some((event, listeners))
    }

    /// Drop entries that have been unobserved for at least `gc_time` and
    /// have no fetch in flight. Returns how many were evicted.
    pub(crate) fn collect_garbage(&mut self, now: DateTime<Utc>, gc_time: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            let expired = entry.subscriber_count == 0
                && entry.in_flight.is_none()
                && match entry.unobserved_since {
                    Some(since) => (now - since).to_std().map(|age| age >= gc_time).unwrap_or(false),
                    None => false,
                };
            if expired {
                tracing::debug!(key = %key, "Evicting unobserved query");
            }
            !expired
        });
        before - self.entries.len()
    }
}
