//! Logging initialization.
//!
//! Library code only emits `tracing` events. Binaries (or host applications
//! that want the client's own sink) call [`init_logging`] or
//! [`init_with_config`] once at startup.
//!
//! When a log path is configured, every event is appended as one JSON object
//! per line. The writer flushes after each write so several processes can
//! share the file.

use crate::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the emitting component, attached to startup output.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL log file.
    pub log_path: Option<PathBuf>,

    /// Also emit compact human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "tally".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Append-only file writer shared by every log line.
#[derive(Clone)]
pub struct JsonlWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl JsonlWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl io::Write for JsonlWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for JsonlWriter {
    type Writer = JsonlWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Initialize stderr logging at the given default level.
///
/// ```ignore
/// init_logging("info")?;
/// tracing::info!("client started");
/// ```
pub fn init_logging(level: &str) -> CoreResult<()> {
    init_with_config(LogConfig {
        default_level: level.into(),
        ..Default::default()
    })
}

/// Initialize logging with explicit configuration.
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_with_config(config: LogConfig) -> CoreResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let file_layer = match &config.log_path {
        Some(path) => {
            let writer = JsonlWriter::new(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    // Without a file there must be somewhere for logs to go.
    let stderr_layer = if config.also_stderr || config.log_path.is_none() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact()
                .with_writer(io::stderr),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    #[test]
    fn default_log_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "tally");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.also_stderr);
    }

    #[test]
    fn jsonl_writer_appends_and_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deeply").join("nested").join("test.jsonl");

        let mut writer = JsonlWriter::new(&path).unwrap();
        writer.write_all(b"{\"a\":1}\n").unwrap();
        let mut second = writer.clone();
        second.write_all(b"{\"b\":2}\n").unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "{\"a\":1}\n{\"b\":2}\n");
    }
}
