//! Settings of the Keel tool itself.
//!
//! These are distinct from the per-target application configuration the
//! pipeline resolves: they control how the pipeline runs and how the tool
//! logs.

use std::collections::HashSet;
use std::path::PathBuf;

use keel_core::TargetId;
use keel_expr::DEFAULT_MAX_DEPTH;
use keel_telemetry::{create_env_filter, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::SettingsResult;

/// Root settings document.
///
/// # Example
///
/// ```toml
/// [pipeline]
/// default_targets = ["frontend", "backend"]
/// max_expression_depth = 32
///
/// [logging]
/// level = "keel_config=debug,info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeelSettings {
    /// How configuration is resolved.
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// How the tool logs.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl KeelSettings {
    /// Settings for local development: verbose pretty logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            logging: LoggingSettings {
                level: "debug".to_string(),
                span_events: true,
                file_line_info: true,
                ..LoggingSettings::default()
            },
        }
    }

    /// Settings for CI: JSON logs and no environment snapshot.
    #[must_use]
    pub fn ci() -> Self {
        Self {
            pipeline: PipelineSettings {
                snapshot_env: false,
                ..PipelineSettings::default()
            },
            logging: LoggingSettings {
                format: "json".to_string(),
                ..LoggingSettings::default()
            },
        }
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> SettingsResult<()> {
        self.pipeline.validate()?;
        self.logging.log_config().map(drop)
    }
}

/// Settings consumed by [`ConfigurationPipeline`](crate::ConfigurationPipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    /// Targets resolved when the caller names none.
    #[serde(default = "TargetId::defaults")]
    pub default_targets: Vec<TargetId>,

    /// Whether the `env` field holds the process environment. When false it
    /// is an empty object.
    #[serde(default = "default_true")]
    pub snapshot_env: bool,

    /// Value of `currentRuntimePath`. Defaults to the working directory.
    #[serde(default)]
    pub runtime_root: Option<PathBuf>,

    /// Nesting limit for expression evaluation.
    #[serde(default = "default_max_depth")]
    pub max_expression_depth: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_targets: TargetId::defaults(),
            snapshot_env: true,
            runtime_root: None,
            max_expression_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl PipelineSettings {
    fn validate(&self) -> SettingsResult<()> {
        if self.default_targets.is_empty() {
            return Err(SettingsError::invalid_value(
                "pipeline.default_targets",
                "at least one target is required",
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.default_targets.iter().find(|t| !seen.insert(*t)) {
            return Err(SettingsError::invalid_value(
                "pipeline.default_targets",
                format!("duplicate target `{duplicate}`"),
            ));
        }

        if self.max_expression_depth == 0 {
            return Err(SettingsError::invalid_value(
                "pipeline.max_expression_depth",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Logging section; converted to a [`LogConfig`] at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Whether logging is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// `json`, `pretty` or `compact`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_line_info: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: default_format(),
            span_events: false,
            file_line_info: false,
        }
    }
}

impl LoggingSettings {
    /// Builds the logging configuration, rejecting unknown formats and
    /// malformed filter directives.
    pub fn log_config(&self) -> SettingsResult<LogConfig> {
        let format: LogFormat = self
            .format
            .parse()
            .map_err(|e: keel_telemetry::TelemetryError| {
                SettingsError::invalid_value("logging.format", e.to_string())
            })?;
        create_env_filter(&self.level)
            .map_err(|e| SettingsError::invalid_value("logging.level", e.to_string()))?;

        Ok(LogConfig {
            enabled: self.enabled,
            filter: self.level.clone(),
            format,
            span_events: self.span_events,
            file_line_info: self.file_line_info,
            include_target: format == LogFormat::Json || self.file_line_info,
            ..LogConfig::default()
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = KeelSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.pipeline.default_targets,
            vec![TargetId::frontend(), TargetId::backend()]
        );
        assert_eq!(settings.pipeline.max_expression_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_presets() {
        assert!(!KeelSettings::ci().pipeline.snapshot_env);
        let log = KeelSettings::ci().logging.log_config().unwrap();
        assert_eq!(log.format, LogFormat::Json);
        assert!(log.include_target);

        let dev = KeelSettings::development().logging.log_config().unwrap();
        assert_eq!(dev.filter, "debug");
        assert!(dev.span_events);
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let mut settings = KeelSettings::default();
        settings.pipeline.default_targets = vec![TargetId::backend(), TargetId::backend()];
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate target `backend`"));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let mut settings = KeelSettings::default();
        settings.pipeline.max_expression_depth = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidValue { field, .. }) if field == "pipeline.max_expression_depth"
        ));
    }

    #[test]
    fn test_bad_logging_rejected() {
        let mut logging = LoggingSettings {
            format: "xml".to_string(),
            ..LoggingSettings::default()
        };
        assert!(logging.log_config().is_err());

        logging.format = "compact".to_string();
        logging.level = "keel=verbose".to_string();
        assert!(matches!(
            logging.log_config(),
            Err(SettingsError::InvalidValue { field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<KeelSettings, _> = toml::from_str(
            r#"
            [pipeline]
            max_depth = 3
            "#,
        );
        assert!(result.is_err());
    }
}
