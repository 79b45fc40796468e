//! Filesystem primitives for the TimescaleDB unit manager
//!
//! Provides locked atomic writes, content fingerprints and
//! format-agnostic document loading.

pub mod checksum;
pub mod document;
pub mod error;
pub mod io;

pub use checksum::compute_bytes_checksum;
pub use document::{DocumentFormat, DocumentStore};
pub use error::{Error, Result};
