//! Dev-mode subscriber: JSONL file output plus optional stderr.
//!
//! Every line is flushed as soon as it is written, so `tail -f` sees events
//! while a command is still running.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// `~/.facility-desk/logs/dev.jsonl`, or the temp dir without a home.
fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".facility-desk")
        .join("logs")
        .join("dev.jsonl")
}

/// Shared handle to an append-only JSONL file.
#[derive(Clone)]
pub struct JsonlFile {
    file: Arc<Mutex<LineWriter<File>>>,
}

impl JsonlFile {
    /// Open `path` for appending, creating parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(LineWriter::new(file))),
        })
    }
}

impl Write for JsonlFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for JsonlFile {
    type Writer = JsonlFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
}

/// Install the dev subscriber. Without a writable log file, only stderr is used.
pub fn init_dev_subscriber(config: &LogConfig) {
    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);
    let (file, open_error) = match JsonlFile::open(&log_path) {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };
    let to_stderr = config.also_stderr || file.is_none();

    let json_layer = file.map(|file| {
        JsonLayer::new(config.service_name.clone(), file).with_filter(env_filter(config))
    });
    let stderr_layer = to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(config))
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }
    match open_error {
        None => tracing::info!(log_path = %log_path.display(), "observability initialized"),
        Some(error) => tracing::warn!(
            log_path = %log_path.display(),
            error = %error,
            "Dev log file unavailable, logging to stderr only"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("dev.jsonl");

        let mut file = JsonlFile::open(&path).unwrap();
        file.write_all(b"{\"level\":\"INFO\"}\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"level\":\"INFO\"}\n"
        );
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dev.jsonl");

        JsonlFile::open(&path).unwrap().write_all(b"a\n").unwrap();
        JsonlFile::open(&path).unwrap().write_all(b"b\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = tempdir().unwrap();
        assert!(JsonlFile::open(dir.path()).is_err());
    }
}
