//! Review model and rating coercion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;
use crate::utils::time::normalize_instant;

/// A review stored under the reviewer's uid, so the key itself guarantees at
/// most one review per user per event.
///
/// The rating is kept as the raw wire value: other writers of the shared
/// store may have written junk, and aggregation tolerates it instead of
/// failing. Use [`Review::rating_value`] for the numeric view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub uid: String,
    pub name: Option<String>,
    pub comment: String,
    pub rating: Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn from_document(doc: &Document) -> Self {
        let fields = &doc.fields;
        Self {
            uid: doc.id.clone(),
            name: fields
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            comment: fields
                .get("comment")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            rating: fields.get("rating").cloned().unwrap_or(Value::Null),
            created_at: fields.get("createdAt").and_then(normalize_instant),
        }
    }

    /// Numeric view of the rating, `None` when it fails coercion.
    pub fn rating_value(&self) -> Option<f64> {
        coerce_rating(&self.rating)
    }
}

/// Coerce a stored rating to a number. JSON numbers and numeric strings
/// qualify; everything else is treated as malformed and skipped by the
/// aggregation engine.
pub fn coerce_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Per-event rating aggregate, derived on demand and never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub avg: Option<f64>,
    pub count: u32,
}
