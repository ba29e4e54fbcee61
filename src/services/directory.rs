//! Batched identity resolution
//!
//! Attendee rosters and review ledgers store raw user identifiers; whenever a
//! human-readable name is needed, this service resolves identifiers to
//! profile records. The backing membership query accepts a bounded number of
//! keys per call, so inputs are partitioned into chunks and looked up
//! concurrently. Resolution never fails the caller: an identity-resolution
//! outage must not lose an event or roster render.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::models::user::{ResolvedUser, UserProfile};
use crate::services::USERS_COLLECTION;
use crate::store::DocumentStore;
use crate::utils::errors::Result;

/// Read-only directory over the user profile collection
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
}

impl UserDirectory {
    /// Create a new UserDirectory instance. `batch_size` is validated
    /// upstream against the store's membership-query limit.
    pub fn new(store: Arc<dyn DocumentStore>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// Resolve user identifiers to profile records, preserving input order
    /// and duplicates.
    ///
    /// The output always has the same length as the input: identifiers with
    /// no matching profile become `{uid, name: None}` stubs, and a total
    /// lookup failure degrades to all stubs instead of raising.
    pub async fn resolve_users(&self, uids: &[String]) -> Vec<ResolvedUser> {
        if uids.is_empty() {
            return Vec::new();
        }
        debug!(
            count = uids.len(),
            batch_size = self.batch_size,
            "Resolving user identifiers in batches"
        );

        let lookups = uids
            .chunks(self.batch_size)
            .map(|chunk| self.store.query_by_ids(USERS_COLLECTION, chunk));

        let snapshots = match try_join_all(lookups).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(error = %e, "Identity lookup failed, degrading to stub records");
                return uids.iter().map(ResolvedUser::stub).collect();
            }
        };

        let mut by_uid: HashMap<String, ResolvedUser> = HashMap::new();
        for doc in snapshots.into_iter().flatten() {
            let profile = UserProfile::from_document(&doc);
            by_uid.insert(profile.uid.clone(), ResolvedUser::from_profile(&profile));
        }

        uids.iter()
            .map(|uid| {
                by_uid
                    .get(uid)
                    .cloned()
                    .unwrap_or_else(|| ResolvedUser::stub(uid))
            })
            .collect()
    }

    /// Point lookup of a single user profile.
    pub async fn find_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let doc = self.store.get(USERS_COLLECTION, uid).await?;
        Ok(doc.as_ref().map(UserProfile::from_document))
    }

    /// Best-effort display-name lookup used for review enrichment. Absence
    /// of a resolvable name is not an error; neither is a store failure.
    pub async fn display_name(&self, uid: &str) -> Option<String> {
        match self.find_profile(uid).await {
            Ok(profile) => profile.and_then(|p| p.display_name),
            Err(e) => {
                debug!(uid = uid, error = %e, "Display-name lookup failed");
                None
            }
        }
    }

    /// Check whether a user carries the admin role; degrades to `false` on
    /// any failure so permission checks fail closed.
    pub async fn is_admin(&self, uid: &str) -> bool {
        match self.find_profile(uid).await {
            Ok(Some(profile)) => profile.is_admin(),
            Ok(None) => false,
            Err(e) => {
                warn!(uid = uid, error = %e, "Admin check failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, Fields, MemoryStore, SortDirection};
    use crate::utils::errors::SyncError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tokio::sync::broadcast;

    async fn seed_user(store: &MemoryStore, uid: &str, name: &str) {
        store
            .set_merge(
                USERS_COLLECTION,
                uid,
                json!({"displayName": name, "role": "user"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_uids_resolve_to_stubs_in_order() {
        let store = MemoryStore::new();
        seed_user(&store, "a", "Alice").await;
        seed_user(&store, "b", "Bob").await;

        let directory = UserDirectory::new(Arc::new(store), 10);
        let resolved = directory
            .resolve_users(&["a".into(), "missing".into(), "b".into()])
            .await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].name.as_deref(), Some("Alice"));
        assert_eq!(resolved[1], ResolvedUser::stub("missing"));
        assert_eq!(resolved[2].name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_duplicates_preserved() {
        let store = MemoryStore::new();
        seed_user(&store, "a", "Alice").await;

        let directory = UserDirectory::new(Arc::new(store), 10);
        let resolved = directory.resolve_users(&["a".into(), "a".into()]).await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0], resolved[1]);
    }

    #[tokio::test]
    async fn test_is_admin_reads_role() {
        let store = MemoryStore::new();
        store
            .set_merge(
                USERS_COLLECTION,
                "boss",
                json!({"role": "admin"}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let directory = UserDirectory::new(Arc::new(store), 10);
        assert!(directory.is_admin("boss").await);
        assert!(!directory.is_admin("nobody").await);
    }

    /// Store whose every operation fails, simulating a backing-store outage.
    struct OfflineStore;

    #[async_trait]
    impl DocumentStore for OfflineStore {
        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>> {
            Err(SyncError::Store("offline".into()))
        }
        async fn add(&self, _: &str, _: Fields) -> Result<String> {
            Err(SyncError::Store("offline".into()))
        }
        async fn set_merge(&self, _: &str, _: &str, _: Fields) -> Result<()> {
            Err(SyncError::Store("offline".into()))
        }
        async fn update(&self, _: &str, _: &str, _: Fields) -> Result<()> {
            Err(SyncError::Store("offline".into()))
        }
        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Err(SyncError::Store("offline".into()))
        }
        async fn array_union(&self, _: &str, _: &str, _: &str, _: &[String]) -> Result<()> {
            Err(SyncError::Store("offline".into()))
        }
        async fn array_remove(&self, _: &str, _: &str, _: &str, _: &[String]) -> Result<()> {
            Err(SyncError::Store("offline".into()))
        }
        async fn query_by_ids(&self, _: &str, _: &[String]) -> Result<Vec<Document>> {
            Err(SyncError::Store("offline".into()))
        }
        async fn query_ordered(
            &self,
            _: &str,
            _: &str,
            _: SortDirection,
            _: Option<DateTime<Utc>>,
        ) -> Result<Vec<Document>> {
            Err(SyncError::Store("offline".into()))
        }
        async fn list_all(&self, _: &str) -> Result<Vec<Document>> {
            Err(SyncError::Store("offline".into()))
        }
        fn watch(&self, _: &str) -> broadcast::Receiver<()> {
            broadcast::channel(1).1
        }
    }

    #[tokio::test]
    async fn test_total_failure_degrades_to_all_stubs() {
        let directory = UserDirectory::new(Arc::new(OfflineStore), 10);
        let uids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let resolved = directory.resolve_users(&uids).await;

        assert_eq!(resolved.len(), 3);
        assert!(resolved.iter().all(|r| r.name.is_none()));
        assert_eq!(resolved[1].uid, "b");
    }
}
