//! # Observability
//!
//! Centralized tracing setup for the facility desk workspace.
//!
//! Crates in the workspace are **log producers**: they use the standard
//! `tracing` macros and never decide where output goes. Binaries call
//! [`init`] or [`init_with_config`] once at startup.
//!
//! ## Dev Mode
//!
//! With the `dev` feature enabled, every event is written as one JSON line to
//! `~/.facility-desk/logs/dev.jsonl` (or [`LogConfig::log_path`]), so the
//! stream can be followed with `tail -f … | jq`. Fields whose names look like
//! credentials (`token`, `password`, `authorization`, `cookie`) are redacted
//! before they reach the file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "desk-cli".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

use std::path::PathBuf;

pub use json_layer::{is_sensitive_field, redact_json, LogEntry, REDACTED};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "desk-cli").
    /// Included in every JSON log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.facility-desk/logs/dev.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with default settings.
///
/// In dev mode, an unwritable log file falls back to stderr output.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Calling this more than once is harmless: the second global subscriber
/// install is rejected and ignored.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config);
    }

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
            )
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .finish()
            .try_init();
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("first");
        init("second");
    }
}
