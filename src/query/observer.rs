//! Query observers: one consumer's subscription to one key.

use super::cache::{ListenerId, QueryEvent};
use super::client::{QueryClient, QueryOptions};
use super::entry::{CacheEntry, QueryStatus};
use super::key::QueryKey;
use crate::error::QueryError;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// What a consumer sees when it reads its query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<V> {
    pub status: QueryStatus,
    /// The selector's view of the cached data; `None` while no data exists.
    pub data: Option<V>,
    pub error: Option<QueryError>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl<V> QueryResult<V> {
    pub(crate) fn from_entry(
        entry: Option<&CacheEntry>,
        stale_time: Duration,
        project: impl FnOnce(&dyn Any) -> Option<V>,
    ) -> Self {
        match entry {
            Some(entry) => Self {
                status: entry.status,
                data: entry.data.as_deref().and_then(project),
                error: entry.error.clone(),
                fetched_at: entry.fetched_at,
                is_stale: entry.data.is_some() && entry.is_stale_at(Utc::now(), stale_time),
                is_fetching: entry.is_fetching(),
            },
            None => Self {
                status: QueryStatus::Idle,
                data: None,
                error: None,
                fetched_at: None,
                is_stale: false,
                is_fetching: false,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

/// A live subscription. Dropping it unsubscribes and removes its listeners.
pub struct QueryObserver<T: 'static, V: 'static> {
    client: QueryClient,
    options: QueryOptions<T, V>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<T: 'static, V: 'static> QueryObserver<T, V> {
    pub(crate) fn new(client: QueryClient, options: QueryOptions<T, V>) -> Self {
        Self {
            client,
            options,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.options.key
    }

    pub fn options(&self) -> &QueryOptions<T, V> {
        &self.options
    }

    /// Current state with the selector applied.
    pub fn result(&self) -> QueryResult<V> {
        self.client.read(&self.options)
    }

    /// Fetch if the entry has no data or stale data, join an in-flight fetch
    /// otherwise, then return the resulting state.
    ///
    /// The returned future owns what it needs, so the observer may be moved
    /// or dropped while it is pending.
    pub fn fetch(&self) -> impl Future<Output = QueryResult<V>> + 'static {
        self.run(false)
    }

    /// Like [`fetch`](Self::fetch) but issues a request even if the data is
    /// fresh. An in-flight fetch is still joined rather than duplicated.
    pub fn refetch(&self) -> impl Future<Output = QueryResult<V>> + 'static {
        self.run(true)
    }

    fn run(&self, force: bool) -> impl Future<Output = QueryResult<V>> + 'static {
        let client = self.client.clone();
        let options = self.options.clone();
        let pending = client.start_or_join(&options.key, Some(options.erased_fetch()), force);
        async move {
            if let Some(pending) = pending {
                // The outcome is recorded on the entry; read it from there.
                let _ = pending.await;
            }
            client.read(&options)
        }
    }

    /// Register a callback fired on every state transition of this key.
    pub fn on_change(&self, callback: impl Fn(&QueryEvent) + 'static) -> ListenerId {
        let id = self.client.add_listener(&self.options.key, callback);
        self.listeners.borrow_mut().push(id);
        id
    }
}

impl<T: 'static, V: 'static> fmt::Debug for QueryObserver<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.client.get(&self.options.key);
        f.debug_struct("QueryObserver")
            .field("key", &self.options.key)
            .field("status", &entry.as_ref().map(|e| e.status))
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<T: 'static, V: 'static> Drop for QueryObserver<T, V> {
    fn drop(&mut self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.client.remove_listener(&self.options.key, id);
        }
        self.client.unsubscribe(&self.options.key);
    }
}
