//! Configuration, paths, and logging setup for the facility desk client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_API_BASE, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
