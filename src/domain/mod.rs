//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: domain types, query keys and derived views
//! - `wire.rs`: raw serde structs matching backend responses
//! - `convert.rs`: `TryFrom`/`From` conversions with validation
//! - `client.rs`: sub-client building query and mutation options
//!
//! Not every slice needs every file.

pub mod candle;
pub mod currency;
pub mod saved;
pub mod ticker;
