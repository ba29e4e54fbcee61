//! Error handling for Syncline
//!
//! This module defines the main error types used throughout the library
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for Syncline operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    #[error("Query not supported by backing store: {0}")]
    UnsupportedQuery(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Syncline operations
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Check if the error is worth retrying against the backing store
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Store(_) => true,
            SyncError::Io(_) => true,
            SyncError::DocumentNotFound { .. } => false,
            SyncError::EventNotFound { .. } => false,
            SyncError::UnsupportedQuery(_) => false,
            SyncError::InvalidInput(_) => false,
            SyncError::Serialization(_) => false,
            SyncError::Config(_) => false,
        }
    }
}
