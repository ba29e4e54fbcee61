//! Event model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;
use crate::utils::time::{is_past, normalize_instant};

/// An event as seen by the client: a read replica of the store's canonical
/// copy. The attendee list is stored as an ordered sequence but carries set
/// semantics; the store's delta mutations guarantee it holds no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub location: String,
    pub description: String,
    pub attendees: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Build an event from its wire document, normalizing every accepted
    /// timestamp representation at this boundary.
    pub fn from_document(doc: &Document) -> Self {
        let fields = &doc.fields;
        Self {
            id: doc.id.clone(),
            name: string_field(fields.get("name")),
            date: fields.get("date").and_then(normalize_instant),
            location: string_field(fields.get("location")),
            description: string_field(fields.get("description")),
            attendees: fields
                .get("attendees")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            created_at: fields.get("createdAt").and_then(normalize_instant),
        }
    }

    /// Whether the event date lies in the past. Undated events are never
    /// considered past.
    pub fn is_past(&self) -> bool {
        is_past(self.date)
    }

    /// Roster membership test against this snapshot.
    pub fn is_attending(&self, uid: &str) -> bool {
        self.attendees.iter().any(|a| a == uid)
    }
}

/// Payload for creating a new event. The catalog always initializes the
/// roster empty and assigns `createdAt` server-side, whatever the caller
/// intended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: String,
}

/// Partial field edits for an existing event; unset fields are untouched.
/// These are last-writer-wins, unlike roster mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventChanges {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

pub(crate) fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

pub(crate) fn instant_to_wire(instant: DateTime<Utc>) -> Value {
    Value::String(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
