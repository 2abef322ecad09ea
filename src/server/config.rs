//! Server configuration
//!
//! Settings for run execution and retention.

use std::time::Duration;

use crate::core::{AcpError, AcpResult};
use crate::runtime::{RunOptions, DEFAULT_CANCEL_GRACE_PERIOD, EVENT_CHANNEL_SIZE};

/// Environment variable for the cancellation grace period, in milliseconds
pub const ENV_CANCEL_GRACE_MS: &str = "ACP_CANCEL_GRACE_MS";

/// Environment variable for the event channel capacity
pub const ENV_EVENT_BUFFER: &str = "ACP_EVENT_BUFFER";

/// Environment variable for the finished-run retention cap
pub const ENV_MAX_COMPLETED_RUNS: &str = "ACP_MAX_COMPLETED_RUNS";

/// Configuration for an `AcpServer`
///
/// Use the builder pattern to configure the server:
///
/// ```ignore
/// let config = ServerConfig::new()
///     .with_cancel_grace_period(Duration::from_secs(2))
///     .with_event_buffer(64)
///     .with_max_completed_runs(1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// How long a cancelled handler may take to stop before it is aborted
    pub cancel_grace_period: Duration,

    /// Capacity of each run's handler-to-driver event channel
    pub event_buffer: usize,

    /// Keep at most this many finished runs (`None` keeps all of them)
    pub max_completed_runs: Option<usize>,
}

impl ServerConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            event_buffer: EVENT_CHANNEL_SIZE,
            max_completed_runs: None,
        }
    }

    /// Read overrides from `ACP_*` environment variables
    pub fn from_env() -> AcpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AcpResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(ms) = parse_var::<u64>(&lookup, ENV_CANCEL_GRACE_MS)? {
            config.cancel_grace_period = Duration::from_millis(ms);
        }
        if let Some(buffer) = parse_var::<usize>(&lookup, ENV_EVENT_BUFFER)? {
            config.event_buffer = buffer;
        }
        if let Some(max) = parse_var::<usize>(&lookup, ENV_MAX_COMPLETED_RUNS)? {
            config.max_completed_runs = Some(max);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the cancellation grace period
    pub fn with_cancel_grace_period(mut self, period: Duration) -> Self {
        self.cancel_grace_period = period;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    /// Enable eviction of the oldest finished runs beyond `max`
    pub fn with_max_completed_runs(mut self, max: usize) -> Self {
        self.max_completed_runs = Some(max);
        self
    }

    /// Check the settings are usable
    pub fn validate(&self) -> AcpResult<()> {
        if self.event_buffer == 0 {
            return Err(AcpError::InvalidConfig(
                "event_buffer must be at least 1".into(),
            ));
        }
        if self.max_completed_runs == Some(0) {
            return Err(AcpError::InvalidConfig(
                "max_completed_runs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Per-run options derived from this configuration
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            cancel_grace_period: self.cancel_grace_period,
            event_buffer: self.event_buffer,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> AcpResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AcpError::InvalidConfig(format!("{} has invalid value '{}'", key, raw))),
    }
}
