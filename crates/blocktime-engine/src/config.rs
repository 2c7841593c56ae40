//! Engine configuration.
//!
//! Provides [`EngineConfig`] with defaults for refinement limits, logging and
//! the transport endpoints. Values can be set programmatically or read from
//! `BLOCKTIME_*` environment variables with [`EngineConfig::from_env`].

use blocktime_core::constants::{DEFAULT_FETCH_WINDOW, DEFAULT_MAX_REFINEMENT_ATTEMPTS};
use blocktime_core::error::BlockTimeError;
use blocktime_source::SourceConfig;

/// Configuration for a [`BlockTime`](crate::BlockTime) instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether refinement may query the block source.
    pub online: bool,
    /// Upper bound on fetch rounds for a single resolve.
    pub max_refinement_attempts: u32,
    /// Number of consecutive blocks requested per fetch.
    pub fetch_window: u64,
    /// Log level filter string (e.g. "info", "debug", "blocktime_engine=trace").
    pub log_level: String,
    /// "json" for structured output, anything else for text.
    pub log_format: String,
    /// HTTP and WebSocket endpoints.
    pub source: SourceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            online: true,
            max_refinement_attempts: DEFAULT_MAX_REFINEMENT_ATTEMPTS,
            fetch_window: DEFAULT_FETCH_WINDOW,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            source: SourceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Preset that never touches the network.
    pub fn offline() -> Self {
        Self {
            online: false,
            ..Self::default()
        }
    }

    /// Read overrides from the environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `BLOCKTIME_OFFLINE` | `online = false` when `1` or `true` |
    /// | `BLOCKTIME_MAX_ATTEMPTS` | `max_refinement_attempts` |
    /// | `BLOCKTIME_LOG` | `log_level` |
    /// | `BLOCKTIME_LOG_FORMAT` | `log_format` |
    ///
    /// Transport variables are handled by [`SourceConfig::from_env`].
    ///
    /// # Errors
    ///
    /// [`BlockTimeError::Config`] if `BLOCKTIME_MAX_ATTEMPTS` is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, BlockTimeError> {
        let defaults = Self::default();

        let online = match std::env::var("BLOCKTIME_OFFLINE") {
            Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => defaults.online,
        };

        let max_refinement_attempts = match std::env::var("BLOCKTIME_MAX_ATTEMPTS") {
            Ok(v) => parse_attempts(&v)?,
            Err(_) => defaults.max_refinement_attempts,
        };

        Ok(Self {
            online,
            max_refinement_attempts,
            fetch_window: defaults.fetch_window,
            log_level: std::env::var("BLOCKTIME_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("BLOCKTIME_LOG_FORMAT").unwrap_or(defaults.log_format),
            source: SourceConfig::from_env(),
        })
    }
}

fn parse_attempts(raw: &str) -> Result<u32, BlockTimeError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BlockTimeError::Config(format!(
            "BLOCKTIME_MAX_ATTEMPTS must be a positive integer, got {raw:?}"
        ))),
    }
}
