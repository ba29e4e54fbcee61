//! Syncline
//!
//! Synchronization core for an event-management client. This library keeps a
//! live, ordered view of events for concurrently connected clients, performs
//! concurrency-safe roster mutations, enforces one review per attendee per
//! event with merge-upsert semantics, computes past-event rating aggregates,
//! and resolves user identifiers to profiles in bounded batches.
//!
//! It sits on top of an abstract multi-writer document store
//! ([`store::DocumentStore`]) with realtime change notification; the UI layer
//! consumes the services in [`services`] and renders whatever they deliver.

pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SyncError};

// Re-export main components for easy access
pub use models::{Event, EventChanges, NewEvent, RatingSummary, ResolvedUser, Review, UserProfile};
pub use services::{
    EventCatalog, EventSubscription, ReviewService, RosterService, ServiceFactory, UserDirectory,
};
pub use store::{DocumentStore, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
