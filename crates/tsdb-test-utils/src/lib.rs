//! Shared test utilities for the TimescaleDB unit manager workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`host`]: [`FakeHost`], a recording stand-in for every host trait
//! - [`store`]: [`MemoryStateStore`], an in-memory state store

pub mod host;
pub mod store;

pub use host::{FakeHost, HostCall};
pub use store::MemoryStateStore;

use tsdb_core::OptionMap;

/// Build an option map from literal pairs
pub fn options(pairs: &[(&str, &str)]) -> OptionMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
