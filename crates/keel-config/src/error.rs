//! Error types for settings loading and configuration resolution.

use std::path::PathBuf;

use keel_core::TargetId;
use keel_expr::ExpressionError;
use keel_hooks::HookExecutionError;
use thiserror::Error;

/// Errors that can occur while loading Keel's own settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file was not found.
    #[error("settings file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Failed to read the settings file.
    #[error("failed to read settings file: {path}")]
    ReadError {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML settings: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON settings: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The settings source is neither TOML nor JSON.
    #[error("unsupported settings format: {format}")]
    UnsupportedFormat {
        /// The extension or format name that was given.
        format: String,
    },

    /// A field holds a value outside its allowed range.
    #[error("invalid settings value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The variable name.
        var: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl SettingsError {
    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an environment parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

/// A target's configuration could not be resolved.
///
/// Both variants carry the target so callers resolving several targets can
/// report which one failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A config hook failed.
    #[error("configuration hooks failed for target `{target}`")]
    Hook {
        /// The target being resolved.
        target: TargetId,
        /// The hook failure.
        #[source]
        source: HookExecutionError,
    },

    /// Expression resolution failed.
    #[error("expression resolution failed for target `{target}`")]
    Expression {
        /// The target being resolved.
        target: TargetId,
        /// The resolver failure.
        #[source]
        source: ExpressionError,
    },
}

impl PipelineError {
    /// The target whose resolution failed.
    pub fn target(&self) -> &TargetId {
        match self {
            Self::Hook { target, .. } | Self::Expression { target, .. } => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_hooks::HookPhase;
    use std::error::Error as _;

    #[test]
    fn test_file_not_found_error() {
        let err = SettingsError::file_not_found("/etc/keel.toml");
        assert!(err.to_string().contains("/etc/keel.toml"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = SettingsError::env_parse_error("KEEL__PIPELINE__SNAPSHOT_ENV", "expected boolean");
        assert_eq!(
            err.to_string(),
            "failed to parse environment variable KEEL__PIPELINE__SNAPSHOT_ENV: expected boolean"
        );
    }

    #[test]
    fn test_pipeline_error_keeps_target_and_source() {
        let err = PipelineError::Hook {
            target: TargetId::frontend(),
            source: HookExecutionError::new(HookPhase::Config, "ext", "proxy", "no upstream"),
        };
        assert_eq!(err.target(), &TargetId::frontend());
        assert_eq!(
            err.to_string(),
            "configuration hooks failed for target `frontend`"
        );
        assert!(err
            .source()
            .map(ToString::to_string)
            .is_some_and(|s| s.contains("no upstream")));
    }
}
