//! Key-addressed query cache with request deduplication, stale-while-revalidate
//! reads, observer notifications, and invalidating mutations.
//!
//! - `key.rs`: structural composite keys
//! - `entry.rs`: per-key lifecycle state
//! - `cache.rs`: the key → entry map and its listeners
//! - `client.rs`: `QueryClient`, the fetch coordinator
//! - `observer.rs`: per-consumer subscriptions and derived views
//! - `mutation.rs`: one-shot writes that invalidate on success

pub mod cache;
pub mod client;
pub mod entry;
pub mod key;
pub mod mutation;
pub mod observer;

pub use cache::{ListenerId, QueryCache, QueryEvent};
pub use client::{QueryClient, QueryConfig, QueryOptions};
pub use entry::{CacheEntry, EntryState, Payload, QueryStatus};
pub use key::{KeyPart, QueryKey};
pub use mutation::{MutationExecutor, MutationNotifier, MutationOptions};
pub use observer::{QueryObserver, QueryResult};
