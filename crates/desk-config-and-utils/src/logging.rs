//! Logging initialization.
//!
//! Thin wrapper over the observability package so binaries share one setup.

use crate::{Config, Paths};
use observability::LogConfig;

/// Initialize tracing for a binary.
///
/// The level comes from `RUST_LOG` when set, otherwise from `config.log_level`.
/// With the `dev-logs` feature, events also land in the central JSONL file.
pub fn init_logging(service_name: &str, config: &Config) {
    let log_path = Paths::new().ok().map(|paths| paths.dev_log_file());

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(&config.log_level).to_string().to_lowercase(),
        log_path,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level. Unknown values fall back to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level(" error "), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_unknown_falls_back_to_info() {
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
        assert_eq!(parse_level(""), tracing::Level::INFO);
    }
}
