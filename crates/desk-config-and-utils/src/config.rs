//! Client configuration.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default backend base URL (can be overridden at compile time via DESK_API_BASE env var).
pub const DEFAULT_API_BASE: &str = match option_env!("DESK_API_BASE") {
    Some(url) => url,
    None => "http://localhost:8080",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where unauthenticated visitors are sent.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Where authenticated visitors without the required role are sent.
pub const DEFAULT_LANDING_PATH: &str = "/requests";

const ENV_API_BASE: &str = "DESK_API_BASE";
const ENV_LOG_LEVEL: &str = "DESK_LOG_LEVEL";

/// Main client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend base URL, e.g. `http://localhost:8080`.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Login entry point used by the route guard.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Authenticated landing page used by the route guard.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_landing_path() -> String {
    DEFAULT_LANDING_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base: default_api_base(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
        }
    }
}

impl Config {
    /// Create a config with default values, then override from the environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration from the config file if present, then apply env overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(api_base) = non_empty(ENV_API_BASE) {
            self.api_base = api_base;
        }
        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
    }

    /// Get the API base as a parsed URL. Only http and https are accepted.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.api_base)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::Config(format!(
                "unsupported API scheme '{}' in {}",
                other, self.api_base
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.landing_path, "/requests");
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.landing_path, DEFAULT_LANDING_PATH);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            api_base: "https://desk.example.com".to_string(),
            landing_path: "/dashboard".to_string(),
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.login_path, DEFAULT_LOGIN_PATH);
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DESK_API_BASE", "https://api.example.com"),
            ("DESK_LOG_LEVEL", "  "),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_base, "https://api.example.com");
        // Blank values are ignored.
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_api_base_url_parse() {
        let config = Config::default();
        let url = config.api_base_url().unwrap();
        assert!(url.scheme().starts_with("http"));
    }

    #[test]
    fn test_api_base_url_rejects_invalid() {
        let config = Config {
            api_base: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.api_base_url(), Err(CoreError::InvalidUrl(_))));

        let config = Config {
            api_base: "ftp://files.example.com".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.api_base_url(), Err(CoreError::Config(_))));
    }
}
