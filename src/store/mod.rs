//! Document store abstraction
//!
//! The synchronization core runs on top of a multi-reader/multi-writer
//! document database with realtime change notification. This module defines
//! the narrow set of primitives the core consumes, so services can be wired
//! against any backend (or the in-memory store in tests) through an explicit
//! handle instead of ambient global state.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::broadcast;

use crate::utils::errors::Result;

pub use memory::MemoryStore;

/// Field bag of a stored document.
pub type Fields = Map<String, Value>;

/// Maximum number of keys accepted by a single membership-test query.
pub const MAX_KEYS_PER_QUERY: usize = 10;

const SERVER_TIMESTAMP_KEY: &str = "__server_timestamp__";

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sentinel value writers pass for server-assigned creation timestamps.
///
/// The store replaces it with its own clock at commit time, so concurrent
/// writers never disagree about what "now" was.
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: true })
}

/// Check whether a field value is the server-timestamp sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(SERVER_TIMESTAMP_KEY))
}

/// Abstract document store consumed by the synchronization services.
///
/// All mutating primitives are conflict-commutative where the data model
/// needs them to be: `array_union`/`array_remove` are delta mutations that
/// concurrent writers can issue in any order, and `set_merge` writes only the
/// supplied fields. Plain `update` is last-writer-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; absence is `Ok(None)`, not an error.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert a new document with a server-assigned identifier.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Merge-semantics upsert: creates the document when absent, otherwise
    /// overwrites only the supplied fields and preserves the rest.
    async fn set_merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Merge the supplied fields into an existing document. Fails with
    /// `SyncError::DocumentNotFound` when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Idempotent point delete.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Add values to a set-valued array field without introducing duplicates.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<()>;

    /// Remove values from a set-valued array field; absent members are a
    /// no-op.
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<()>;

    /// Membership-test query by document id, limited to
    /// [`MAX_KEYS_PER_QUERY`] keys per call. Unknown ids are simply absent
    /// from the result.
    async fn query_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Range+order query over an instant-valued field. May fail with
    /// `SyncError::UnsupportedQuery` when the backing store has no index for
    /// the combination; callers with a fallback must degrade to `list_all`.
    ///
    /// Documents whose order field does not normalize to an instant are
    /// excluded, matching index semantics. `before` filters strictly.
    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Document>>;

    /// Fetch the entire collection, unordered.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Change notification for a collection: fires after every mutation.
    /// Receivers re-query to observe the new state.
    fn watch(&self, collection: &str) -> broadcast::Receiver<()>;
}
