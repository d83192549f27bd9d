//! Tracing subscriber setup
//!
//! This module provides shared tracing configuration used by both
//! embedding applications and tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber with file logging.
///
/// This sets up:
/// - File-based logging with the given log file
/// - Environment-based filtering (RUST_LOG) with DEBUG default
///
/// Returns false if the log file could not be created or a global
/// subscriber was already installed.
pub fn init_global(log_file_path: &Path) -> bool {
    let log_file = match File::create(log_file_path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let subscriber = build_subscriber(log_file);
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Build a subscriber with file logging.
///
/// This is the core subscriber configuration shared between production and tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());

    let fmt_layer = fmt::layer().with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_events_reach_the_log_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("buffer reconciliation warning");
            tracing::debug!("session state transition");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("buffer reconciliation warning"));
        assert!(contents.contains("session state transition"));
    }

    #[test]
    fn test_trace_level_filtered_by_default() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("too fine grained");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(!contents.contains("too fine grained"));
    }
}
