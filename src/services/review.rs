//! Review ledger and rating aggregation
//!
//! Reviews live in a per-event collection keyed by the reviewer's uid, so at
//! most one review per attendee per event holds by construction. Submissions
//! are merge-upserts: resubmitting overwrites only the supplied fields.
//! Aggregates are recomputed on demand from the raw ledger and tolerate
//! malformed entries written by other clients.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::models::review::{coerce_rating, RatingSummary, Review};
use crate::services::{directory::UserDirectory, reviews_collection};
use crate::store::{server_timestamp, DocumentStore, Fields};
use crate::utils::errors::Result;

/// Service for review submission, lookup and aggregation
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn DocumentStore>,
    directory: UserDirectory,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>, directory: UserDirectory) -> Self {
        Self { store, directory }
    }

    /// Submit or update the review of `uid` for `event_id`.
    ///
    /// Merge-upsert keyed by (event, uid): a first submission creates the
    /// record, a resubmission overwrites only the supplied fields. When no
    /// display name is passed, one is looked up best-effort from the user
    /// directory; an unresolvable name stays null. Eligibility (past event,
    /// roster membership, comment length, rating range) is the caller's
    /// responsibility. Store failures propagate, never silently.
    pub async fn submit_review(
        &self,
        event_id: &str,
        uid: &str,
        comment: &str,
        rating: i64,
        name_hint: Option<String>,
    ) -> Result<()> {
        let name = match name_hint {
            Some(name) => Some(name),
            None => self.directory.display_name(uid).await,
        };

        let mut fields = Fields::new();
        fields.insert("uid".to_string(), Value::String(uid.to_string()));
        fields.insert(
            "name".to_string(),
            name.map(Value::String).unwrap_or(Value::Null),
        );
        fields.insert("comment".to_string(), Value::String(comment.to_string()));
        fields.insert("rating".to_string(), json!(rating));
        fields.insert("createdAt".to_string(), server_timestamp());

        self.store
            .set_merge(&reviews_collection(event_id), uid, fields)
            .await?;
        info!(event_id = event_id, uid = uid, rating = rating, "Review stored");
        Ok(())
    }

    /// The review of `uid` for `event_id`, or `None` when absent.
    ///
    /// A stored review missing its display name is enriched best-effort
    /// before returning; enrichment failure never fails the lookup.
    pub async fn get_user_review(&self, event_id: &str, uid: &str) -> Result<Option<Review>> {
        let Some(doc) = self.store.get(&reviews_collection(event_id), uid).await? else {
            return Ok(None);
        };
        let mut review = Review::from_document(&doc);
        if review.name.is_none() {
            review.name = self.directory.display_name(uid).await;
        }
        Ok(Some(review))
    }

    /// All reviews for an event, newest first.
    ///
    /// Missing display names are backfilled in a single batched identity
    /// pass; an identity outage leaves them null rather than failing.
    pub async fn get_reviews(&self, event_id: &str) -> Result<Vec<Review>> {
        let docs = self.store.list_all(&reviews_collection(event_id)).await?;
        let mut reviews: Vec<Review> = docs.iter().map(Review::from_document).collect();
        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.uid.cmp(&b.uid))
        });

        let missing: Vec<String> = reviews
            .iter()
            .filter(|r| r.name.is_none())
            .map(|r| r.uid.clone())
            .collect();
        if !missing.is_empty() {
            debug!(
                event_id = event_id,
                count = missing.len(),
                "Backfilling review names"
            );
            let resolved = self.directory.resolve_users(&missing).await;
            let names: HashMap<String, Option<String>> = resolved
                .into_iter()
                .map(|r| (r.uid, r.name))
                .collect();
            for review in reviews.iter_mut().filter(|r| r.name.is_none()) {
                if let Some(name) = names.get(&review.uid) {
                    review.name = name.clone();
                }
            }
        }

        Ok(reviews)
    }

    /// Count and arithmetic mean of the valid ratings for an event.
    ///
    /// Each stored rating is coerced to a number; entries that fail coercion
    /// are excluded from both the sum and the count. Zero valid ratings
    /// yield `{avg: None, count: 0}`, as does a read failure: statistics are
    /// a degrading read path and never crash the consumer.
    pub async fn average_rating(&self, event_id: &str) -> RatingSummary {
        let docs = match self.store.list_all(&reviews_collection(event_id)).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(event_id = event_id, error = %e, "Rating scan failed, reporting empty");
                return RatingSummary::default();
            }
        };

        let ratings: Vec<f64> = docs
            .iter()
            .filter_map(|doc| doc.fields.get("rating").and_then(|v| coerce_rating(v)))
            .collect();

        if ratings.is_empty() {
            RatingSummary {
                avg: None,
                count: 0,
            }
        } else {
            RatingSummary {
                avg: Some(ratings.iter().sum::<f64>() / ratings.len() as f64),
                count: ratings.len() as u32,
            }
        }
    }
}
