//! One-shot remote writes with invalidation on success.
//!
//! A mutation never writes into the cache. When its request succeeds the
//! keys it names are invalidated through the [`QueryClient`], which refetches
//! any of them that are being observed. When it fails the cache is not
//! touched at all and the error goes back to the caller (and to the optional
//! notifier, which UIs use for a blocking alert).
//!
//! Concurrent mutations on the same target are neither coalesced nor
//! serialized: whichever completes last determines what the next refetch sees.

use super::client::QueryClient;
use super::key::QueryKey;
use crate::error::{HttpError, MutationError};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::rc::Rc;

/// Callback for surfacing a failed mutation to the user.
pub type MutationNotifier = Rc<dyn Fn(&MutationError)>;

/// A write request plus the keys it makes stale.
pub struct MutationOptions<O> {
    action: String,
    run: Rc<dyn Fn() -> LocalBoxFuture<'static, Result<O, HttpError>>>,
    invalidates: Vec<QueryKey>,
}

impl<O: 'static> MutationOptions<O> {
    /// `action` names the write for logs and error messages (`"save BTC"`).
    pub fn new<F, Fut>(action: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<O, HttpError>> + 'static,
    {
        Self {
            action: action.into(),
            run: Rc::new(move || run().boxed_local()),
            invalidates: Vec::new(),
        }
    }

    /// Add a key to invalidate when the write succeeds.
    pub fn invalidates(mut self, key: QueryKey) -> Self {
        self.invalidates.push(key);
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn invalidated_keys(&self) -> &[QueryKey] {
        &self.invalidates
    }
}

impl<O> Clone for MutationOptions<O> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            run: self.run.clone(),
            invalidates: self.invalidates.clone(),
        }
    }
}

/// Executes mutations against a shared [`QueryClient`].
#[derive(Clone)]
pub struct MutationExecutor {
    client: QueryClient,
    notifier: Option<MutationNotifier>,
}

impl MutationExecutor {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: MutationNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Perform exactly one write. On success, invalidate and wait for the
    /// resulting refetches of observed keys.
    pub async fn execute<O: 'static>(&self, options: &MutationOptions<O>) -> Result<O, MutationError> {
        tracing::debug!(action = %options.action, "Executing mutation");
        match (options.run)().await {
            Ok(output) => {
                if !options.invalidates.is_empty() {
                    self.client.invalidate_queries(&options.invalidates).await;
                }
                Ok(output)
            }
            Err(source) => {
                let err = MutationError {
                    action: options.action.clone(),
                    source,
                };
                tracing::warn!(error = %err, "Mutation failed");
                if let Some(notify) = &self.notifier {
                    notify(&err);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryOptions, QueryStatus};
    use std::cell::{Cell, RefCell};

    fn saved_key() -> QueryKey {
        QueryKey::new(["saved-ticker-list"])
    }

    #[tokio::test]
    async fn test_success_invalidates_listed_keys() {
        let client = QueryClient::default();
        client.set_data(saved_key(), vec!["BTC".to_string()]);

        let executor = MutationExecutor::new(client.clone());
        let save = MutationOptions::new("save ETH", || async { Ok(()) }).invalidates(saved_key());
        executor.execute(&save).await.unwrap();

        let state = client.get(&saved_key()).unwrap();
        assert!(state.is_stale);
        assert!(state.data_ptr.is_some(), "invalidation keeps data");
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched_and_notifies() {
        let client = QueryClient::default();
        client.set_data(saved_key(), vec!["BTC".to_string()]);
        let before = client.snapshot();

        let alerts = Rc::new(RefCell::new(Vec::new()));
        let sink = alerts.clone();
        let executor = MutationExecutor::new(client.clone())
            .with_notifier(Rc::new(move |e: &MutationError| sink.borrow_mut().push(e.to_string())));

        let remove = MutationOptions::new("remove BTC", || async {
            Err::<(), _>(HttpError::ServerError {
                status: 500,
                body: "boom".into(),
            })
        })
        .invalidates(saved_key());

        let err = executor.execute(&remove).await.unwrap_err();
        assert_eq!(err.action, "remove BTC");
        assert_eq!(client.snapshot(), before);
        assert_eq!(alerts.borrow().len(), 1);
        assert!(alerts.borrow()[0].starts_with("remove BTC failed"));
    }

    #[tokio::test]
    async fn test_success_refetches_observed_key() {
        let client = QueryClient::default();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        let observer = client
            .observe(QueryOptions::new(saved_key(), move || {
                counter.set(counter.get() + 1);
                let n = counter.get();
                async move { Ok(n) }
            }))
            .await;
        assert_eq!(observer.result().data, Some(1));

        let executor = MutationExecutor::new(client.clone());
        let save = MutationOptions::new("save ETH", || async { Ok(()) }).invalidates(saved_key());
        executor.execute(&save).await.unwrap();

        let result = observer.result();
        assert_eq!(calls.get(), 2);
        assert_eq!(result.data, Some(2));
        assert_eq!(result.status, QueryStatus::Success);
        assert!(!result.is_stale);
    }

    #[tokio::test]
    async fn test_each_execute_is_one_write() {
        let client = QueryClient::default();
        let writes = Rc::new(Cell::new(0));
        let counter = writes.clone();
        let executor = MutationExecutor::new(client);
        let save = MutationOptions::new("save BTC", move || {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });

        executor.execute(&save).await.unwrap();
        executor.execute(&save).await.unwrap();
        assert_eq!(writes.get(), 2);
    }
}
