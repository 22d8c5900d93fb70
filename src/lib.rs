//! # Tickerboard SDK
//!
//! Client core of the Tickerboard crypto dashboard, for native and WASM
//! targets.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: shared types, domain slices, errors (always available, WASM-safe)
//! 2. **Query**: key-addressed cache, fetch coordinator, observers, mutations
//! 3. **Chart**: sample normalization, scales, resize-reactive redraw loop
//! 4. **HTTP API**: `TickerboardHttp` with configurable read retries
//! 5. **High-Level Client**: `TickerboardClient` with nested sub-clients
//!
//! Everything is single-threaded: the query client is `Rc`-based and its
//! futures are `!Send`, matching the browser's event loop. On native targets
//! drive it from a current-thread runtime or a `LocalSet`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickerboard_sdk::prelude::*;
//!
//! let client = TickerboardClient::builder()
//!     .base_url("http://localhost:3000")
//!     .on_mutation_error(|e| eprintln!("{e}"))
//!     .build()?;
//!
//! let list = client.tickers().list(SortBy::Volume).await;
//! for ticker in list.result().data.unwrap_or_default() {
//!     println!("{} {} {}", ticker.symbol, ticker.formatted_last(), ticker.formatted_rate());
//! }
//!
//! let session = client.charts().session(Ticker::new("BTC"), Interval::default(), |frame: &ChartFrame<'_>| {
//!     println!("{}", frame.svg_path());
//! });
//! session.resize(ContainerSize::new(800.0, 500.0));
//! session.load().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes, raw wire values and number formatting.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, sub-clients.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Query ───────────────────────────────────────────────────────────

/// Query cache, fetch coordination and mutations.
pub mod query;

// ── Layer 3: Chart ───────────────────────────────────────────────────────────

/// Chart pipeline: normalize, scale, redraw.
pub mod chart;

// ── Layer 4: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `TickerboardClient`: the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{format_number, format_with_digits, Ticker};

    // Domain types
    pub use crate::domain::candle::wire::CandleSample;
    pub use crate::domain::candle::{ChartSession, Interval, LoadOutcome};
    pub use crate::domain::currency::{Currency, CurrencyMap};
    pub use crate::domain::saved::{SaveAction, SavedTickerSet};
    pub use crate::domain::ticker::{SortBy, TickerDetail, TickerSummary, Trend};

    // Query layer
    pub use crate::query::{
        MutationExecutor, MutationOptions, QueryClient, QueryConfig, QueryKey, QueryObserver,
        QueryOptions, QueryResult, QueryStatus,
    };

    // Chart pipeline
    pub use crate::chart::{
        ChartEvent, ChartFrame, ChartRenderer, ContainerSize, PlotPoint, RedrawLoop,
        ResizeObserver,
    };

    // Errors
    pub use crate::error::{HttpError, MutationError, QueryError, SdkError, ValidationError};

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        ChartsClient, CurrenciesClient, SavedClient, TickerboardClient, TickerboardClientBuilder,
        TickersClient,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
}
