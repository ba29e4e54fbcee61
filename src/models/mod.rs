//! Data models module
//!
//! This module contains the data structures exchanged between the
//! synchronization services and the presentation layer.

pub mod event;
pub mod review;
pub mod user;

// Re-export commonly used models
pub use event::{Event, EventChanges, NewEvent};
pub use review::{coerce_rating, RatingSummary, Review};
pub use user::{ResolvedUser, UserProfile, UserRole};
