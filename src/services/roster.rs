//! Attendee roster mutations
//!
//! The roster is the only piece of event state mutated by many writers at
//! once, so every operation here is a delta mutation against the store's
//! attendee field: commutative and idempotent, never read-modify-write. Two
//! admins adding different uids concurrently converge on the same final set
//! regardless of delivery order.

use std::sync::Arc;

use tracing::debug;

use crate::services::{ATTENDEES_FIELD, EVENTS_COLLECTION};
use crate::store::DocumentStore;
use crate::utils::errors::{Result, SyncError};

/// Service for attendee roster mutations
#[derive(Clone)]
pub struct RosterService {
    store: Arc<dyn DocumentStore>,
}

impl RosterService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Add a user to an event's roster. Adding an already-present uid is a
    /// no-op; no duplicate is ever introduced.
    pub async fn add_attendee(&self, event_id: &str, uid: &str) -> Result<()> {
        debug!(event_id = event_id, uid = uid, "Adding attendee");
        map_missing_event(
            self.store
                .array_union(EVENTS_COLLECTION, event_id, ATTENDEES_FIELD, &[uid.to_string()])
                .await,
            event_id,
        )
    }

    /// Remove a user from an event's roster. Removing an absent uid is a
    /// no-op.
    pub async fn remove_attendee(&self, event_id: &str, uid: &str) -> Result<()> {
        debug!(event_id = event_id, uid = uid, "Removing attendee");
        map_missing_event(
            self.store
                .array_remove(EVENTS_COLLECTION, event_id, ATTENDEES_FIELD, &[uid.to_string()])
                .await,
            event_id,
        )
    }

    /// Set roster membership to the caller-supplied desired state.
    ///
    /// The desired state comes from the caller's latest event snapshot, not
    /// from a fresh server read, so a stale snapshot can toggle against
    /// outdated membership. Callers should re-derive membership from the
    /// live feed before toggling; prefer `add_attendee`/`remove_attendee`
    /// when the desired state is already known absolutely.
    pub async fn toggle_rsvp(&self, event_id: &str, uid: &str, going: bool) -> Result<()> {
        if going {
            self.add_attendee(event_id, uid).await
        } else {
            self.remove_attendee(event_id, uid).await
        }
    }
}

fn map_missing_event(result: Result<()>, event_id: &str) -> Result<()> {
    match result {
        Err(SyncError::DocumentNotFound { .. }) => Err(SyncError::EventNotFound {
            event_id: event_id.to_string(),
        }),
        other => other,
    }
}
