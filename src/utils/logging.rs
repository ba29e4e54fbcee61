//! Logging configuration and setup
//!
//! This module provides logging initialization for applications embedding the
//! synchronization core. The core itself only emits `tracing` events; whether
//! and where they surface is the embedder's decision.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// Returns the worker guard for the file writer when file logging is enabled;
/// the caller must keep it alive for the duration of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::new(&config.level);

    match &config.file_path {
        Some(path) => {
            let file_appender = tracing_appender::rolling::daily(path, "syncline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
                .init();

            info!("Logging initialized with level: {}", config.level);
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .init();

            info!("Logging initialized with level: {}", config.level);
            Ok(None)
        }
    }
}
