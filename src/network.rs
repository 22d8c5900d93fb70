//! Network URL constants for the Tickerboard SDK.

/// Default REST API base URL (the dashboard's own API routes).
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
