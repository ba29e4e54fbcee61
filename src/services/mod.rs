//! Services module
//!
//! Business logic of the synchronization core: the event catalog and live
//! feed, roster mutations, the review ledger with its aggregates, and
//! batched identity resolution. Every service takes its store handle
//! explicitly, so the whole layer runs unchanged against the in-memory store
//! in tests.

pub mod catalog;
pub mod directory;
pub mod review;
pub mod roster;

// Re-export commonly used services
pub use catalog::{EventCatalog, EventSubscription};
pub use directory::UserDirectory;
pub use review::ReviewService;
pub use roster::RosterService;

use std::sync::Arc;

use crate::config::Settings;
use crate::store::DocumentStore;
use crate::utils::errors::Result;

/// Collection holding event documents.
pub const EVENTS_COLLECTION: &str = "events";
/// Collection holding user profile documents, owned by the auth subsystem.
pub const USERS_COLLECTION: &str = "users";

pub(crate) const ATTENDEES_FIELD: &str = "attendees";
pub(crate) const DATE_FIELD: &str = "date";

/// Collection path of the per-event review ledger. Part of the shared store
/// layout: other clients of the same database address reviews through it.
pub fn reviews_collection(event_id: &str) -> String {
    format!("{}/{}/reviews", EVENTS_COLLECTION, event_id)
}

/// Service factory wiring all services to one store handle
#[derive(Clone)]
pub struct ServiceFactory {
    pub catalog: EventCatalog,
    pub roster: RosterService,
    pub reviews: ReviewService,
    pub directory: UserDirectory,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized against the
    /// given store handle. Settings are validated before any wiring.
    pub fn new(store: Arc<dyn DocumentStore>, settings: Settings) -> Result<Self> {
        settings.validate()?;

        let directory = UserDirectory::new(Arc::clone(&store), settings.store.lookup_batch_size);
        let catalog = EventCatalog::new(Arc::clone(&store));
        let roster = RosterService::new(Arc::clone(&store));
        let reviews = ReviewService::new(store, directory.clone());

        Ok(Self {
            catalog,
            roster,
            reviews,
            directory,
        })
    }
}
