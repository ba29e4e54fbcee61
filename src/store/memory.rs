//! In-memory document store
//!
//! Backend used by the test suite and by embedders that want the full
//! synchronization surface without a remote database. Implements every
//! primitive of [`DocumentStore`], including change notification and the
//! server-timestamp sentinel. `without_server_indexes` simulates a backend
//! that rejects range+order queries so fallback paths can be exercised.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::store::{
    is_server_timestamp, Document, DocumentStore, Fields, SortDirection, MAX_KEYS_PER_QUERY,
};
use crate::utils::errors::{Result, SyncError};

const WATCH_CHANNEL_CAPACITY: usize = 64;

/// Query counters, mainly useful for asserting batching behavior in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub membership_queries: u64,
    pub ordered_queries: u64,
    pub full_scans: u64,
}

#[derive(Default)]
struct Counters {
    membership_queries: AtomicU64,
    ordered_queries: AtomicU64,
    full_scans: AtomicU64,
}

/// In-memory implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, BTreeMap<String, Fields>>>>,
    watchers: Arc<Mutex<HashMap<String, broadcast::Sender<()>>>>,
    counters: Arc<Counters>,
    server_indexes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            watchers: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            server_indexes: true,
        }
    }

    /// A store whose `query_ordered` always reports `UnsupportedQuery`,
    /// mimicking a backend with no index for the range+order combination.
    pub fn without_server_indexes() -> Self {
        Self {
            server_indexes: false,
            ..Self::new()
        }
    }

    /// Snapshot of the query counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            membership_queries: self.counters.membership_queries.load(Ordering::Relaxed),
            ordered_queries: self.counters.ordered_queries.load(Ordering::Relaxed),
            full_scans: self.counters.full_scans.load(Ordering::Relaxed),
        }
    }

    fn notify(&self, collection: &str) {
        let watchers = self.watchers.lock().unwrap();
        if let Some(sender) = watchers.get(collection) {
            // Nobody listening is fine.
            let _ = sender.send(());
        }
    }

    fn materialize_timestamps(fields: &mut Fields) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        for value in fields.values_mut() {
            if is_server_timestamp(value) {
                *value = Value::String(now.clone());
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn add(&self, collection: &str, mut fields: Fields) -> Result<String> {
        Self::materialize_timestamps(&mut fields);
        let id = Uuid::new_v4().to_string();
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields);
        }
        self.notify(collection);
        Ok(id)
    }

    async fn set_merge(&self, collection: &str, id: &str, mut fields: Fields) -> Result<()> {
        Self::materialize_timestamps(&mut fields);
        {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();
            let existing = docs.entry(id.to_string()).or_default();
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, mut fields: Fields) -> Result<()> {
        Self::materialize_timestamps(&mut fields);
        {
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| SyncError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(collection)
                .map(|docs| docs.remove(id).is_some())
                .unwrap_or(false)
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<()> {
        {
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| SyncError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let entry = existing
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !entry.is_array() {
                *entry = Value::Array(Vec::new());
            }
            if let Value::Array(array) = entry {
                for value in values {
                    let candidate = Value::String(value.clone());
                    if !array.contains(&candidate) {
                        array.push(candidate);
                    }
                }
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<()> {
        {
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| SyncError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            if let Some(array) = existing.get_mut(field).and_then(Value::as_array_mut) {
                array.retain(|item| {
                    item.as_str()
                        .map(|s| !values.iter().any(|v| v == s))
                        .unwrap_or(true)
                });
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn query_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        if ids.len() > MAX_KEYS_PER_QUERY {
            return Err(SyncError::InvalidInput(format!(
                "membership query accepts at most {} keys, got {}",
                MAX_KEYS_PER_QUERY,
                ids.len()
            )));
        }
        self.counters
            .membership_queries
            .fetch_add(1, Ordering::Relaxed);

        let collections = self.collections.read().await;
        let docs = collections.get(collection);
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(fields) = docs.and_then(|d| d.get(id)) {
                results.push(Document::new(id.clone(), fields.clone()));
            }
        }
        Ok(results)
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Document>> {
        if !self.server_indexes {
            return Err(SyncError::UnsupportedQuery(format!(
                "no index on {}.{}",
                collection, order_by
            )));
        }
        self.counters.ordered_queries.fetch_add(1, Ordering::Relaxed);

        let collections = self.collections.read().await;
        let mut rows: Vec<(DateTime<Utc>, Document)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter_map(|(id, fields)| {
                        let instant =
                            crate::utils::time::normalize_instant(fields.get(order_by)?)?;
                        Some((instant, Document::new(id.clone(), fields.clone())))
                    })
                    .filter(|(instant, _)| before.map(|limit| *instant < limit).unwrap_or(true))
                    .collect()
            })
            .unwrap_or_default();

        // Identifier tie-break keeps ordering deterministic in both directions.
        rows.sort_by(|(ta, da), (tb, db)| match direction {
            SortDirection::Ascending => ta.cmp(tb).then_with(|| da.id.cmp(&db.id)),
            SortDirection::Descending => tb.cmp(ta).then_with(|| da.id.cmp(&db.id)),
        });

        Ok(rows.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.counters.full_scans.fetch_add(1, Ordering::Relaxed);
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn watch(&self, collection: &str) -> broadcast::Receiver<()> {
        let mut watchers = self.watchers.lock().unwrap();
        watchers
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(WATCH_CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::server_timestamp;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn test_array_union_deduplicates() {
        let store = MemoryStore::new();
        let id = store
            .add("events", fields(json!({"attendees": []})))
            .await
            .unwrap();

        store
            .array_union("events", &id, "attendees", &["u1".into()])
            .await
            .unwrap();
        store
            .array_union("events", &id, "attendees", &["u1".into(), "u2".into()])
            .await
            .unwrap();

        let doc = store.get("events", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["attendees"], json!(["u1", "u2"]));
    }

    #[tokio::test]
    async fn test_array_remove_absent_is_noop() {
        let store = MemoryStore::new();
        let id = store
            .add("events", fields(json!({"attendees": ["u1"]})))
            .await
            .unwrap();

        store
            .array_remove("events", &id, "attendees", &["nobody".into()])
            .await
            .unwrap();

        let doc = store.get("events", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["attendees"], json!(["u1"]));
    }

    #[tokio::test]
    async fn test_set_merge_preserves_unspecified_fields() {
        let store = MemoryStore::new();
        store
            .set_merge("reviews", "u1", fields(json!({"comment": "ok", "rating": 7})))
            .await
            .unwrap();
        store
            .set_merge("reviews", "u1", fields(json!({"rating": 9})))
            .await
            .unwrap();

        let doc = store.get("reviews", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["comment"], json!("ok"));
        assert_eq!(doc.fields["rating"], json!(9));
    }

    #[tokio::test]
    async fn test_server_timestamp_materialized_on_write() {
        let store = MemoryStore::new();
        let id = store
            .add("events", fields(json!({"createdAt": server_timestamp()})))
            .await
            .unwrap();

        let doc = store.get("events", &id).await.unwrap().unwrap();
        let created = crate::utils::time::normalize_instant(&doc.fields["createdAt"]);
        assert!(created.is_some());
    }

    #[tokio::test]
    async fn test_membership_query_enforces_key_limit() {
        let store = MemoryStore::new();
        let ids: Vec<String> = (0..11).map(|i| format!("u{i}")).collect();
        let err = store.query_by_ids("users", &ids).await.unwrap_err();
        assert_matches!(err, SyncError::InvalidInput(_));
    }

    #[tokio::test]
    async fn test_query_ordered_without_indexes_is_unsupported() {
        let store = MemoryStore::without_server_indexes();
        let err = store
            .query_ordered("events", "date", SortDirection::Descending, None)
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::UnsupportedQuery(_));
    }

    #[tokio::test]
    async fn test_watch_fires_on_every_mutation() {
        let store = MemoryStore::new();
        let mut rx = store.watch("events");

        let id = store.add("events", Fields::new()).await.unwrap();
        store
            .update("events", &id, fields(json!({"name": "x"})))
            .await
            .unwrap();
        store.delete("events", &id).await.unwrap();

        for _ in 0..3 {
            rx.try_recv().expect("mutation should notify watchers");
        }
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update("events", "ghost", Fields::new())
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::DocumentNotFound { .. });
    }
}
