//! Logging initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter`, a human
//! readable layer on stderr, and optionally a JSON file layer that rolls daily.
//!
//! ```ignore
//! let _guard = logging::init_logging_with(
//!     LoggingConfig::new().with_level("debug").with_log_dir("logs"),
//! )?;
//! ```
//!
//! Keep the returned guard alive for the life of the process; dropping it
//! flushes and stops the file writer.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default filter directive when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "acp_run_core=info";

/// File name prefix for rolled log files
pub const LOG_FILE_PREFIX: &str = "acp-run.log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Write JSON instead of plain text to stderr
    pub json: bool,

    /// Also write JSON logs to daily files in this directory
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
            log_dir: None,
        }
    }

    /// Set the level for this crate, e.g. `"debug"`
    pub fn with_level(mut self, level: &str) -> Self {
        self.filter = format!("acp_run_core={}", level);
        self
    }

    /// Set a full filter directive, e.g. `"acp_run_core=debug,tokio=warn"`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging with default settings
pub fn init_logging() -> anyhow::Result<Option<WorkerGuard>> {
    init_logging_with(LoggingConfig::default())
}

/// Initialize logging
///
/// Returns the file writer guard when a log directory is configured. Fails
/// if a global subscriber is already installed or the directory cannot be
/// created.
pub fn init_logging_with(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let (layer, guard) = file_layer(dir)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // File layer first; it is typed over the bare registry
    tracing_subscriber::registry()
        .with(file_layer)
        .with(config.env_filter())
        .with(stderr_layer)
        .try_init()?;

    tracing::debug!(filter = %config.filter, log_dir = ?config.log_dir, "Logging initialized");

    Ok(guard)
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn file_layer(dir: &Path) -> anyhow::Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .boxed();

    Ok((layer, guard))
}
