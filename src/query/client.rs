//! Fetch coordination: `QueryClient`.
//!
//! One `QueryClient` per session. It is cheap to clone (all clones share the
//! same cache) and is handed to every component that reads or invalidates
//! remote data. It is single-threaded by construction: fetches are local
//! futures polled by whoever awaits them, and no cache borrow is held across
//! an `.await` or while user callbacks run.

use super::cache::{Listener, ListenerId, QueryCache, QueryEvent};
use super::entry::{CacheEntry, EntryState, InFlight, Payload, QueryStatus};
use super::key::QueryKey;
use super::observer::{QueryObserver, QueryResult};
use crate::error::QueryError;
use chrono::Utc;
use futures_util::future::{join_all, LocalBoxFuture};
use futures_util::FutureExt;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Type-erased fetch function stored per key for background refetches.
pub(crate) type ErasedFetch = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<Payload, QueryError>>>;

// ─── Config ──────────────────────────────────────────────────────────────────

/// Freshness and retention policy.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Successful data younger than this is served without refetching.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before `collect_garbage` drops it.
    pub gc_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            gc_time: Duration::from_secs(300),
        }
    }
}

// ─── QueryOptions ────────────────────────────────────────────────────────────

/// Key, fetch function and selector for one logical query.
///
/// `T` is the raw payload stored in the cache; `V` is the derived view each
/// consumer reads through `select`. The selector must be pure.
pub struct QueryOptions<T, V = T> {
    pub key: QueryKey,
    fetch: Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T, QueryError>>>,
    select: Rc<dyn Fn(&T) -> V>,
}

impl<T: Clone + 'static> QueryOptions<T, T> {
    /// Options whose view is the raw payload itself.
    pub fn new<F, Fut>(key: QueryKey, fetch: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, QueryError>> + 'static,
    {
        Self {
            key,
            fetch: Rc::new(move || fetch().boxed_local()),
            select: Rc::new(|data: &T| data.clone()),
        }
    }
}

impl<T: 'static, V: 'static> QueryOptions<T, V> {
    /// Replace the selector, changing the view type.
    pub fn select<W, S>(self, select: S) -> QueryOptions<T, W>
    where
        S: Fn(&T) -> W + 'static,
    {
        QueryOptions {
            key: self.key,
            fetch: self.fetch,
            select: Rc::new(select),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub(crate) fn apply_select(&self, data: &T) -> V {
        (self.select)(data)
    }

    pub(crate) fn erased_fetch(&self) -> ErasedFetch {
        let fetch = self.fetch.clone();
        Rc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|data| Rc::new(data) as Payload) }.boxed_local()
        })
    }
}

impl<T, V> Clone for QueryOptions<T, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetch: self.fetch.clone(),
            select: self.select.clone(),
        }
    }
}

// ─── QueryClient ─────────────────────────────────────────────────────────────

/// Shared cache plus the fetch coordinator around it.
#[derive(Clone)]
pub struct QueryClient {
    cache: Rc<RefCell<QueryCache>>,
    fetchers: Rc<RefCell<HashMap<QueryKey, ErasedFetch>>>,
    config: QueryConfig,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            cache: Rc::new(RefCell::new(QueryCache::new())),
            fetchers: Rc::new(RefCell::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    // ── Observation ──────────────────────────────────────────────────────

    /// Register an observer without fetching. The entry is created if needed
    /// and the key's refetch function is (re)registered.
    pub fn subscribe<T: 'static, V: 'static>(&self, options: QueryOptions<T, V>) -> QueryObserver<T, V> {
        self.fetchers
            .borrow_mut()
            .insert(options.key.clone(), options.erased_fetch());
        self.cache.borrow_mut().subscribe(&options.key);
        QueryObserver::new(self.clone(), options)
    }

    /// Subscribe and make sure the key has data: fetch if absent or stale,
    /// or join the fetch already in flight.
    pub async fn observe<T: 'static, V: 'static>(&self, options: QueryOptions<T, V>) -> QueryObserver<T, V> {
        let observer = self.subscribe(options);
        observer.fetch().await;
        observer
    }

    /// Fetch into the cache without subscribing (warm-up before a view
    /// mounts). Fresh data is left alone.
    pub async fn prefetch<T: 'static, V: 'static>(&self, options: &QueryOptions<T, V>) -> Result<(), QueryError> {
        match self.start_or_join(&options.key, Some(options.erased_fetch()), false) {
            Some(pending) => pending.await,
            None => Ok(()),
        }
    }

    /// Read the key's current state through `options`' selector.
    pub fn read<T: 'static, V: 'static>(&self, options: &QueryOptions<T, V>) -> QueryResult<V> {
        let cache = self.cache.borrow();
        QueryResult::from_entry(cache.get(&options.key), self.config.stale_time, |payload| {
            match payload.downcast_ref::<T>() {
                Some(data) => Some(options.apply_select(data)),
                None => {
                    tracing::warn!(key = %options.key, "Cached payload has an unexpected type");
                    None
                }
            }
        })
    }

    // ── Direct cache access ──────────────────────────────────────────────

    pub fn get(&self, key: &QueryKey) -> Option<EntryState> {
        self.cache.borrow().get(key).map(CacheEntry::state)
    }

    /// Replace an entry. A fetch in flight for `key` is superseded.
    pub fn put(&self, key: QueryKey, entry: CacheEntry) {
        self.cache.borrow_mut().put(key.clone(), entry);
        self.notify(&key);
    }

    /// Store `data` as a fresh success for `key`.
    pub fn set_data<T: 'static>(&self, key: QueryKey, data: T) {
        self.put(key, CacheEntry::with_data(data));
    }

    pub fn remove(&self, key: &QueryKey) {
        self.cache.borrow_mut().remove(key);
        self.fetchers.borrow_mut().remove(key);
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
        self.fetchers.borrow_mut().clear();
    }

    pub fn snapshot(&self) -> BTreeMap<QueryKey, EntryState> {
        self.cache.borrow().snapshot()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub(crate) fn unsubscribe(&self, key: &QueryKey) {
        self.cache.borrow_mut().unsubscribe(key, Utc::now());
    }

    /// Evict entries unobserved for longer than `gc_time`.
    pub fn collect_garbage(&self) -> usize {
        let mut cache = self.cache.borrow_mut();
        let evicted = cache.collect_garbage(Utc::now(), self.config.gc_time);
        self.fetchers
            .borrow_mut()
            .retain(|key, _| cache.contains(key));
        evicted
    }

    // ── Invalidation ─────────────────────────────────────────────────────

    /// Mark `keys` stale and refetch the ones with subscribers. Resolves once
    /// those refetches settle; their failures are recorded on the entries.
    pub async fn invalidate_queries(&self, keys: &[QueryKey]) {
        let active = self.cache.borrow_mut().invalidate(keys);
        for key in keys {
            self.notify(key);
        }
        self.refetch_all(active).await;
    }

    /// [`invalidate_queries`](Self::invalidate_queries) for every key under `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &QueryKey) {
        let (touched, active) = {
            let mut cache = self.cache.borrow_mut();
            let touched: Vec<QueryKey> = cache.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
            let active = cache.invalidate_prefix(prefix);
            (touched, active)
        };
        for key in &touched {
            self.notify(key);
        }
        self.refetch_all(active).await;
    }

    /// Refetch `keys`. A key whose fetch was already in flight joins it, and
    /// once it settles gets one follow-up request, since that fetch was issued
    /// before the invalidation.
    async fn refetch_all(&self, keys: Vec<QueryKey>) {
        let joined: Vec<QueryKey> = {
            let cache = self.cache.borrow();
            keys.iter()
                .filter(|key| cache.get(key).is_some_and(CacheEntry::is_fetching))
                .cloned()
                .collect()
        };
        self.await_fetches(&keys).await;

        let follow_up: Vec<QueryKey> = {
            let cache = self.cache.borrow();
            joined
                .into_iter()
                .filter(|key| {
                    cache.get(key).is_some_and(|e| {
                        e.is_stale && e.status == QueryStatus::Success && e.subscriber_count > 0
                    })
                })
                .collect()
        };
        if !follow_up.is_empty() {
            tracing::debug!(keys = follow_up.len(), "Refetching keys invalidated mid-fetch");
            self.await_fetches(&follow_up).await;
        }
    }

    async fn await_fetches(&self, keys: &[QueryKey]) {
        let pending: Vec<(QueryKey, InFlight)> = keys
            .iter()
            .filter_map(|key| Some((key.clone(), self.start_or_join(key, None, false)?)))
            .collect();
        let (keys, pending): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        for (key, outcome) in keys.iter().zip(join_all(pending).await) {
            if let Err(e) = outcome {
                tracing::debug!(key = %key, error = %e, "Background refetch failed");
            }
        }
    }

    // ── Listeners ────────────────────────────────────────────────────────

    pub fn add_listener(&self, key: &QueryKey, listener: impl Fn(&QueryEvent) + 'static) -> ListenerId {
        let listener: Listener = Rc::new(listener);
        self.cache.borrow_mut().add_listener(key, listener)
    }

    pub fn remove_listener(&self, key: &QueryKey, id: ListenerId) {
        self.cache.borrow_mut().remove_listener(key, id);
    }

    fn notify(&self, key: &QueryKey) {
        let pending = self.cache.borrow().pending_notification(key);
        if let Some((event, listeners)) = pending {
            for listener in listeners {
                listener(&event);
            }
        }
    }

    // ── Coordination core ────────────────────────────────────────────────

    /// Join the fetch in flight for `key`, or issue a new one if the entry
    /// needs it (or `force` is set). Returns `None` when the cached data is
    /// fresh or no fetch function is known for the key.
    pub(crate) fn start_or_join(
        &self,
        key: &QueryKey,
        fetch: Option<ErasedFetch>,
        force: bool,
    ) -> Option<InFlight> {
        {
            let mut cache = self.cache.borrow_mut();
            let entry = cache.entry_mut(key);
            if let Some(pending) = &entry.in_flight {
                tracing::debug!(key = %key, "Joining in-flight fetch");
                return Some(pending.clone());
            }
            if !force && !entry.needs_fetch(Utc::now(), self.config.stale_time) {
                return None;
            }
        }

        let fetch = match fetch {
            Some(f) => f,
            None => self.fetchers.borrow().get(key).cloned()?,
        };

        // The cache borrow is released while user code builds the future.
        let request = fetch();

        let pending = {
            let mut cache = self.cache.borrow_mut();
            let generation = cache.next_generation();
            let entry = cache.entry_mut(key);
            entry.generation = generation;
            entry.invalidated_in_flight = false;
            entry.status = QueryStatus::Loading;

            let weak = Rc::downgrade(&self.cache);
            let settle_key = key.clone();
            let task: InFlight = async move {
                let outcome = request.await;
                settle(&weak, &settle_key, generation, outcome)
            }
            .boxed_local()
            .shared();

            entry.in_flight = Some(task.clone());
            tracing::debug!(key = %key, generation, "Issued fetch");
            task
        };

        self.notify(key);
        Some(pending)
    }
}

/// Apply a completed fetch to its entry, unless it has been superseded.
fn settle(
    cache: &Weak<RefCell<QueryCache>>,
    key: &QueryKey,
    generation: u64,
    outcome: Result<Payload, QueryError>,
) -> Result<(), QueryError> {
    let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);

    let Some(cache) = cache.upgrade() else {
        return result;
    };

    let notification = {
        let mut cache = cache.borrow_mut();
        let Some(entry) = cache.get_mut(key) else {
            tracing::debug!(key = %key, "Discarding response for removed query");
            return result;
        };
        if entry.generation != generation {
            tracing::debug!(
                key = %key,
                issued = generation,
                current = entry.generation,
                "Discarding superseded response"
            );
            return result;
        }

        entry.in_flight = None;
        let invalidated = std::mem::take(&mut entry.invalidated_in_flight);
        match outcome {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.status = QueryStatus::Success;
                entry.fetched_at = Some(Utc::now());
                entry.is_stale = invalidated;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Query failed");
                entry.error = Some(e);
                entry.status = QueryStatus::Error;
            }
        }
        cache.pending_notification(key)
    };

    if let Some((event, listeners)) = notification {
        for listener in listeners {
            listener(&event);
        }
    }
    result
}
