//! Configuration validation

use crate::config::settings::Settings;
use crate::store::MAX_KEYS_PER_QUERY;
use crate::utils::errors::SyncError;

/// Validate the loaded settings before wiring any service.
pub fn validate_settings(settings: &Settings) -> Result<(), SyncError> {
    if settings.store.lookup_batch_size == 0 {
        return Err(SyncError::Config(
            "store.lookup_batch_size must be at least 1".to_string(),
        ));
    }

    if settings.store.lookup_batch_size > MAX_KEYS_PER_QUERY {
        return Err(SyncError::Config(format!(
            "store.lookup_batch_size cannot exceed the backing store limit of {}",
            MAX_KEYS_PER_QUERY
        )));
    }

    if settings.logging.level.trim().is_empty() {
        return Err(SyncError::Config(
            "logging.level must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_oversized_batch_rejected() {
        let mut settings = Settings::default();
        settings.store.lookup_batch_size = 25;
        assert_matches!(validate_settings(&settings), Err(SyncError::Config(_)));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let mut settings = Settings::default();
        settings.store.lookup_batch_size = 0;
        assert_matches!(validate_settings(&settings), Err(SyncError::Config(_)));
    }
}
