//! Utility modules
//!
//! Shared error types, timestamp normalization and logging setup.

pub mod errors;
pub mod logging;
pub mod time;

pub use errors::{Result, SyncError};
pub use time::{is_past, normalize_instant};
