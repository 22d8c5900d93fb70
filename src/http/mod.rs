//! HTTP client layer: `TickerboardHttp` with configurable read retries.

pub mod client;
pub mod retry;

pub use client::TickerboardHttp;
pub use retry::{RetryConfig, RetryPolicy};
