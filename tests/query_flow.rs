//! Integration tests for the query layer: request deduplication,
//! stale-while-revalidate, invalidation and mutations.
//!
//! Fetches are gated by oneshot channels so each test decides when a request
//! completes, and futures are polled by hand with `tokio_test::task`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready, task};

use tickerboard_sdk::error::{HttpError, MutationError, QueryError};
use tickerboard_sdk::query::{
    MutationExecutor, MutationOptions, QueryClient, QueryKey, QueryOptions, QueryStatus,
};

type Reply = Result<u32, QueryError>;

/// Fetch function whose requests complete only when released.
#[derive(Clone, Default)]
struct Gate {
    pending: Rc<RefCell<VecDeque<oneshot::Sender<Reply>>>>,
    calls: Rc<Cell<u32>>,
}

impl Gate {
    fn options(&self, key: QueryKey) -> QueryOptions<u32> {
        let gate = self.clone();
        QueryOptions::new(key, move || {
            let (tx, rx) = oneshot::channel();
            gate.pending.borrow_mut().push_back(tx);
            gate.calls.set(gate.calls.get() + 1);
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(QueryError::Transport("gate dropped".into())))
            }
        })
    }

    /// Complete the oldest outstanding request.
    fn release(&self, reply: Reply) {
        let tx = self
            .pending
            .borrow_mut()
            .pop_front()
            .expect("no request is pending");
        tx.send(reply).expect("request was abandoned");
    }

    fn calls(&self) -> u32 {
        self.calls.get()
    }
}

fn saved_key() -> QueryKey {
    QueryKey::new(["saved-ticker-list"])
}

#[test]
fn concurrent_observers_share_one_request() {
    let client = QueryClient::default();
    let gate = Gate::default();

    let mut first = task::spawn(client.observe(gate.options(saved_key())));
    let mut second = task::spawn(client.observe(gate.options(saved_key())));
    assert_pending!(first.poll());
    assert_pending!(second.poll());
    assert_eq!(gate.calls(), 1);
    assert_eq!(client.get(&saved_key()).unwrap().status, QueryStatus::Loading);

    gate.release(Ok(7));
    let a = assert_ready!(first.poll());
    let b = assert_ready!(second.poll());

    assert_eq!(a.result().data, Some(7));
    assert_eq!(b.result().data, Some(7));
    assert_eq!(client.get(&saved_key()).unwrap().subscriber_count, 2);
    assert_eq!(gate.calls(), 1);
}

#[test]
fn loading_keeps_serving_previous_data() {
    let client = QueryClient::default();
    let gate = Gate::default();
    client.set_data(saved_key(), 1u32);

    let observer = client.subscribe(gate.options(saved_key()));
    let mut refetch = task::spawn(observer.refetch());
    assert_pending!(refetch.poll());

    let during = observer.result();
    assert_eq!(during.status, QueryStatus::Loading);
    assert!(during.is_fetching);
    assert_eq!(during.data, Some(1));

    gate.release(Ok(2));
    let after = assert_ready!(refetch.poll());
    assert_eq!(after.data, Some(2));
    assert!(!after.is_fetching);
}

#[test]
fn manual_write_during_fetch_wins_over_late_response() {
    let client = QueryClient::default();
    let gate = Gate::default();

    let mut observe = task::spawn(client.observe(gate.options(saved_key())));
    assert_pending!(observe.poll());

    client.set_data(saved_key(), 99u32);
    gate.release(Ok(1));

    let observer = assert_ready!(observe.poll());
    let result = observer.result();
    assert_eq!(result.data, Some(99));
    assert_eq!(result.status, QueryStatus::Success);
}

#[test]
fn invalidation_during_fetch_refetches_once_it_settles() {
    let client = QueryClient::default();
    let gate = Gate::default();

    let mut observe = task::spawn(client.observe(gate.options(saved_key())));
    assert_pending!(observe.poll());

    let keys = [saved_key()];
    let mut invalidate = task::spawn(client.invalidate_queries(&keys));
    assert_pending!(invalidate.poll());
    assert_eq!(gate.calls(), 1, "the fetch in flight is joined, not duplicated");

    // The first response predates the invalidation: it is served but stays stale.
    gate.release(Ok(3));
    let observer = assert_ready!(observe.poll());
    assert_pending!(invalidate.poll());
    assert_eq!(gate.calls(), 2);
    let during = observer.result();
    assert_eq!(during.data, Some(3));
    assert!(during.is_stale);
    assert!(during.is_fetching);

    gate.release(Ok(4));
    assert_ready!(invalidate.poll());
    let after = observer.result();
    assert_eq!(after.data, Some(4));
    assert!(!after.is_stale);
    assert_eq!(gate.calls(), 2);
}

#[test]
fn unobserved_key_invalidated_mid_fetch_refetches_on_next_observe() {
    let client = QueryClient::default();
    let gate = Gate::default();
    let options = gate.options(saved_key());

    let mut prefetch = task::spawn(client.prefetch(&options));
    assert_pending!(prefetch.poll());

    let keys = [saved_key()];
    let mut invalidate = task::spawn(client.invalidate_queries(&keys));
    assert_ready!(invalidate.poll());

    gate.release(Ok(1));
    assert_ready!(prefetch.poll()).unwrap();
    assert!(client.get(&saved_key()).unwrap().is_stale);

    let mut observe = task::spawn(client.observe(options.clone()));
    assert_pending!(observe.poll());
    assert_eq!(gate.calls(), 2);
    gate.release(Ok(2));
    let observer = assert_ready!(observe.poll());
    assert_eq!(observer.result().data, Some(2));
    assert!(!observer.result().is_stale);
}

#[test]
fn response_issued_before_remove_is_discarded() {
    let client = QueryClient::default();
    let gate = Gate::default();

    let mut before_remove = task::spawn(client.observe(gate.options(saved_key())));
    assert_pending!(before_remove.poll());

    client.remove(&saved_key());
    let mut after_remove = task::spawn(client.observe(gate.options(saved_key())));
    assert_pending!(after_remove.poll());
    assert_eq!(gate.calls(), 2);

    gate.release(Ok(1));
    let orphan = assert_ready!(before_remove.poll());
    let state = client.get(&saved_key()).unwrap();
    assert_eq!(state.status, QueryStatus::Loading);
    assert!(state.is_fetching);
    assert_eq!(orphan.result().data, None);

    // Still in flight, so a forced refetch joins instead of duplicating.
    let mut forced = task::spawn(orphan.refetch());
    assert_pending!(forced.poll());
    assert_eq!(gate.calls(), 2);

    gate.release(Ok(2));
    let observer = assert_ready!(after_remove.poll());
    assert_eq!(observer.result().data, Some(2));
    assert_eq!(assert_ready!(forced.poll()).data, Some(2));
}

#[tokio::test]
async fn error_after_success_keeps_data() {
    let client = QueryClient::default();
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let options = QueryOptions::new(saved_key(), move || {
        counter.set(counter.get() + 1);
        let n = counter.get();
        async move {
            if n == 1 {
                Ok(10u32)
            } else {
                Err(QueryError::Transport("connection reset".into()))
            }
        }
    });

    let observer = client.observe(options).await;
    assert_eq!(observer.result().data, Some(10));

    let result = observer.refetch().await;
    assert_eq!(result.status, QueryStatus::Error);
    assert_eq!(result.data, Some(10));
    assert_eq!(
        result.error,
        Some(QueryError::Transport("connection reset".into()))
    );

    let result = observer.refetch().await;
    assert_eq!(calls.get(), 3);
    assert!(result.is_error());
}

#[tokio::test]
async fn success_clears_previous_error() {
    let client = QueryClient::default();
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let options = QueryOptions::new(saved_key(), move || {
        counter.set(counter.get() + 1);
        let n = counter.get();
        async move {
            if n == 1 {
                Err(QueryError::Decode("truncated".into()))
            } else {
                Ok(n)
            }
        }
    });

    let observer = client.observe(options).await;
    assert!(observer.result().is_error());
    assert_eq!(observer.result().data, None);

    let result = observer.fetch().await;
    assert!(result.is_success());
    assert_eq!(result.error, None);
    assert_eq!(result.data, Some(2));
}

#[tokio::test]
async fn mutation_without_observer_marks_stale_then_next_observe_fetches_once() {
    let client = QueryClient::default();
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let options = QueryOptions::new(saved_key(), move || {
        counter.set(counter.get() + 1);
        let n = counter.get();
        async move { Ok(n) }
    });

    client.prefetch(&options).await.unwrap();
    assert_eq!(calls.get(), 1);

    let executor = MutationExecutor::new(client.clone());
    let save = MutationOptions::new("save BTC", || async { Ok(()) }).invalidates(saved_key());
    executor.execute(&save).await.unwrap();

    let state = client.get(&saved_key()).unwrap();
    assert!(state.is_stale);
    assert_eq!(state.status, QueryStatus::Success);
    assert_eq!(calls.get(), 1, "nobody observes the key, so nothing refetches");

    let observer = client.observe(options.clone()).await;
    assert_eq!(calls.get(), 2);
    assert_eq!(observer.result().data, Some(2));

    let _again = client.observe(options).await;
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn failed_mutation_leaves_cache_unchanged() {
    let client = QueryClient::default();
    client.set_data(saved_key(), vec!["BTC".to_string()]);
    client.set_data(QueryKey::new(["ticker-list"]), 5u32);
    let before = client.snapshot();

    let alerts = Rc::new(Cell::new(0));
    let sink = alerts.clone();
    let executor = MutationExecutor::new(client.clone())
        .with_notifier(Rc::new(move |_: &MutationError| sink.set(sink.get() + 1)));
    let remove = MutationOptions::new("remove BTC", || async {
        Err::<(), _>(HttpError::ServerError {
            status: 503,
            body: "unavailable".into(),
        })
    })
    .invalidates(saved_key());

    let err = executor.execute(&remove).await.unwrap_err();
    assert!(matches!(err.source, HttpError::ServerError { status: 503, .. }));
    assert_eq!(client.snapshot(), before);
    assert_eq!(alerts.get(), 1);
}

#[tokio::test]
async fn prefix_invalidation_refetches_observed_keys_only() {
    let client = QueryClient::default();
    let fetches = Rc::new(RefCell::new(Vec::new()));

    let options_for = |interval: &'static str| {
        let log = fetches.clone();
        QueryOptions::new(
            QueryKey::new(["candle-chart", "BTC", interval]),
            move || {
                log.borrow_mut().push(interval);
                async { Ok(0u8) }
            },
        )
    };

    let observed = client.observe(options_for("1m")).await;
    client.prefetch(&options_for("5m")).await.unwrap();
    client.set_data(QueryKey::new(["ticker-list"]), 1u8);
    fetches.borrow_mut().clear();

    client
        .invalidate_prefix(&QueryKey::new(["candle-chart", "BTC"]))
        .await;

    assert_eq!(*fetches.borrow(), vec!["1m"]);
    assert!(client
        .get(&QueryKey::new(["candle-chart", "BTC", "5m"]))
        .unwrap()
        .is_stale);
    assert!(!client.get(&QueryKey::new(["ticker-list"])).unwrap().is_stale);
    assert!(!observed.result().is_stale);
}
