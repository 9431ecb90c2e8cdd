//! Structured logging for Keel.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
//! single fmt layer, either JSON (for CI and machine consumption) or a
//! human-readable pretty/compact format (for terminals).
//!
//! # Example
//!
//! ```rust,ignore
//! use keel_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(target_id = "frontend", "resolving configuration");
//! ```

use std::str::FromStr;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV_VAR: &str = "KEEL_LOG";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line, human-readable output.
    #[default]
    Pretty,
    /// Single-line, human-readable output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(TelemetryError::LoggingInit(format!(
                "unknown log format `{other}` (expected json, pretty or compact)"
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `keel_config=debug,warn`.
    pub filter: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether `KEEL_LOG` may override [`filter`](Self::filter).
    pub env_override: bool,

    /// Whether to emit span open/close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the event's module path.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            env_override: true,
            span_events: false,
            file_line_info: false,
            include_target: false,
        }
    }
}

impl LogConfig {
    /// Verbose, human-readable output for local debugging.
    #[must_use]
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            span_events: true,
            file_line_info: true,
            include_target: true,
            ..Self::default()
        }
    }

    /// JSON output for CI pipelines.
    #[must_use]
    pub fn ci() -> Self {
        Self {
            format: LogFormat::Json,
            include_target: true,
            ..Self::default()
        }
    }

    /// The filter to install, honouring `KEEL_LOG` when allowed.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if self.env_override {
            if let Ok(directive) = std::env::var(LOG_ENV_VAR) {
                return create_env_filter(&directive);
            }
        }
        create_env_filter(&self.filter)
    }
}

/// Installs the global subscriber described by `config`.
///
/// Fails if another global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.env_filter()?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::invalid_filter(directive, e))
}

/// Standard field names used in Keel's structured logs.
pub mod fields {
    /// Target identifier (`frontend`, `backend`, ...).
    pub const TARGET_ID: &str = "target_id";

    /// Hook phase.
    pub const PHASE: &str = "phase";

    /// Extension that contributed a hook.
    pub const EXTENSION: &str = "extension";

    /// Hook name.
    pub const HOOK: &str = "hook";

    /// Middleware unit name.
    pub const MIDDLEWARE: &str = "middleware";

    /// Position in a chain or phase.
    pub const POSITION: &str = "position";

    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::ci().format, LogFormat::Json);
        let dev = LogConfig::development();
        assert!(dev.span_events);
        assert_eq!(dev.filter, "debug");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("keel_config=debug,warn").is_ok());
        assert!(matches!(
            create_env_filter("keel=verbose"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_invalid_filter_rejected_before_install() {
        let config = LogConfig {
            filter: "keel=verbose".to_string(),
            env_override: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
