//! User profile model
//!
//! Profiles are owned by the authentication subsystem and read-only from this
//! core's perspective; they exist here for name enrichment and role checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;
use crate::utils::time::normalize_instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    fn from_wire(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("admin") => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> Self {
        let fields = &doc.fields;
        Self {
            uid: doc.id.clone(),
            display_name: fields
                .get("displayName")
                .and_then(Value::as_str)
                .map(str::to_string),
            role: UserRole::from_wire(fields.get("role")),
            email: fields
                .get("email")
                .and_then(Value::as_str)
                .map(str::to_string),
            created_at: fields.get("createdAt").and_then(normalize_instant),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Result of a batched identity lookup: a full profile reduced to the render
/// surface, or a stub when the identifier resolves to nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedUser {
    pub uid: String,
    pub name: Option<String>,
}

impl ResolvedUser {
    pub fn stub(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: None,
        }
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            name: profile.display_name.clone(),
        }
    }
}
