//! Event catalog and live feed
//!
//! Ordered view of the event collection with point CRUD, a live snapshot
//! subscription, and the past-events query with its client-side fallback.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::event::{instant_to_wire, Event, EventChanges, NewEvent};
use crate::services::{ATTENDEES_FIELD, DATE_FIELD, EVENTS_COLLECTION};
use crate::store::{server_timestamp, DocumentStore, Fields, SortDirection};
use crate::utils::errors::{Result, SyncError};

/// Handle for an active live-feed subscription.
///
/// Deliveries continue until [`unsubscribe`](EventSubscription::unsubscribe)
/// is called; dropping the handle without unsubscribing leaks the delivery
/// task for the life of the runtime.
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    /// Stop further deliveries and release the underlying subscription.
    /// Idempotent: extra calls are harmless.
    pub fn unsubscribe(&self) {
        self.task.abort();
    }
}

/// Service for event catalog operations and the live feed
#[derive(Clone)]
pub struct EventCatalog {
    store: Arc<dyn DocumentStore>,
}

impl EventCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Subscribe to the live event feed.
    ///
    /// The callback receives the full current list of events, ordered by
    /// date ascending, once immediately and then again after every change to
    /// the collection. This is a replace-the-world contract: consumers swap
    /// their copy wholesale rather than applying diffs.
    pub async fn subscribe_events<F>(&self, on_change: F) -> EventSubscription
    where
        F: Fn(Vec<Event>) + Send + Sync + 'static,
    {
        // Register the watcher before the initial snapshot so no change
        // between the two is missed.
        let mut rx = self.store.watch(EVENTS_COLLECTION);
        let on_change = Arc::new(on_change);

        match self.ordered_snapshot().await {
            Ok(events) => on_change(events),
            Err(e) => warn!(error = %e, "Initial event snapshot failed, awaiting next change"),
        }

        let catalog = self.clone();
        let callback = Arc::clone(&on_change);
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(()) => {}
                    // A lagged receiver only means missed notifications; the
                    // snapshot below reflects the latest state anyway.
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                match catalog.ordered_snapshot().await {
                    Ok(events) => callback(events),
                    Err(e) => warn!(error = %e, "Event snapshot failed, skipping delivery"),
                }
            }
        });

        EventSubscription { task }
    }

    /// Point lookup by event id; absence is `Ok(None)`.
    pub async fn get_event_by_id(&self, id: &str) -> Result<Option<Event>> {
        let doc = self.store.get(EVENTS_COLLECTION, id).await?;
        Ok(doc.as_ref().map(Event::from_document))
    }

    /// Create a new event and return its server-assigned identifier.
    ///
    /// The roster always starts empty and `createdAt` is always stamped
    /// server-side, regardless of caller input.
    pub async fn create_event(&self, payload: NewEvent) -> Result<String> {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::String(payload.name));
        fields.insert(DATE_FIELD.to_string(), instant_to_wire(payload.date));
        fields.insert("location".to_string(), Value::String(payload.location));
        fields.insert(
            "description".to_string(),
            Value::String(payload.description),
        );
        fields.insert(ATTENDEES_FIELD.to_string(), Value::Array(Vec::new()));
        fields.insert("createdAt".to_string(), server_timestamp());

        let id = self.store.add(EVENTS_COLLECTION, fields).await?;
        info!(event_id = %id, "Event created");
        Ok(id)
    }

    /// Apply partial field edits to an event. Last-writer-wins; the roster
    /// is never touched here.
    pub async fn update_event(&self, id: &str, changes: EventChanges) -> Result<()> {
        let mut fields = Fields::new();
        if let Some(name) = changes.name {
            fields.insert("name".to_string(), Value::String(name));
        }
        if let Some(date) = changes.date {
            fields.insert(DATE_FIELD.to_string(), instant_to_wire(date));
        }
        if let Some(location) = changes.location {
            fields.insert("location".to_string(), Value::String(location));
        }
        if let Some(description) = changes.description {
            fields.insert("description".to_string(), Value::String(description));
        }
        if fields.is_empty() {
            debug!(event_id = id, "Empty event update, nothing to do");
            return Ok(());
        }

        match self.store.update(EVENTS_COLLECTION, id, fields).await {
            Err(SyncError::DocumentNotFound { .. }) => Err(SyncError::EventNotFound {
                event_id: id.to_string(),
            }),
            other => other,
        }
    }

    /// Delete an event. The event's review collection is intentionally left
    /// in place: reviews of past events keep their audit value even after
    /// the event record is gone.
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        self.store.delete(EVENTS_COLLECTION, id).await?;
        info!(event_id = id, "Event deleted");
        Ok(())
    }

    /// Events whose date lies strictly in the past, newest first.
    ///
    /// Primary path is a server-side range query; when the backing store has
    /// no index for it, the whole collection is fetched and filtered and
    /// sorted client-side. Both paths order identically: date descending,
    /// identifier ascending on ties.
    pub async fn get_past_events(&self) -> Result<Vec<Event>> {
        let now = Utc::now();
        match self
            .store
            .query_ordered(
                EVENTS_COLLECTION,
                DATE_FIELD,
                SortDirection::Descending,
                Some(now),
            )
            .await
        {
            Ok(docs) => Ok(docs.iter().map(Event::from_document).collect()),
            Err(SyncError::UnsupportedQuery(reason)) => {
                debug!(reason = %reason, "Range query unavailable, filtering client-side");
                let docs = self.store.list_all(EVENTS_COLLECTION).await?;
                let mut events: Vec<Event> = docs
                    .iter()
                    .map(Event::from_document)
                    .filter(|e| matches!(e.date, Some(date) if date < now))
                    .collect();
                events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
                Ok(events)
            }
            Err(e) => Err(e),
        }
    }

    /// Full ordered snapshot backing the live feed: date ascending,
    /// identifier ascending on ties. Undated events are excluded, matching
    /// the ordered-index semantics of the primary path.
    async fn ordered_snapshot(&self) -> Result<Vec<Event>> {
        match self
            .store
            .query_ordered(EVENTS_COLLECTION, DATE_FIELD, SortDirection::Ascending, None)
            .await
        {
            Ok(docs) => Ok(docs.iter().map(Event::from_document).collect()),
            Err(SyncError::UnsupportedQuery(_)) => {
                let docs = self.store.list_all(EVENTS_COLLECTION).await?;
                let mut events: Vec<Event> = docs
                    .iter()
                    .map(Event::from_document)
                    .filter(|e| e.date.is_some())
                    .collect();
                events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
                Ok(events)
            }
            Err(e) => Err(e),
        }
    }
}
