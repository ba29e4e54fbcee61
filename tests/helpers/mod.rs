//! Shared helpers for the integration test suite
//!
//! Everything runs against the in-memory store; these builders keep the test
//! bodies about behavior instead of wiring.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use syncline::config::Settings;
use syncline::services::USERS_COLLECTION;
use syncline::store::{DocumentStore, MemoryStore};
use syncline::{NewEvent, ServiceFactory};

/// Wire a full service factory around the given store with default settings.
pub fn factory(store: &MemoryStore) -> ServiceFactory {
    ServiceFactory::new(Arc::new(store.clone()), Settings::default())
        .expect("default settings are valid")
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}

pub fn new_event(name: &str, date: DateTime<Utc>) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        date,
        location: "Main hall".to_string(),
        description: "An event".to_string(),
    }
}

/// Seed a user profile the way the auth subsystem writes them.
pub async fn seed_profile(store: &MemoryStore, uid: &str, name: &str) {
    store
        .set_merge(
            USERS_COLLECTION,
            uid,
            json!({
                "displayName": name,
                "email": format!("{uid}@example.com"),
                "role": "user",
                "createdAt": Utc::now().to_rfc3339(),
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .await
        .unwrap();
}
