//! Settings loader with file and environment support.
//!
//! Settings are layered in this order (later layers win):
//!
//! 1. Built-in defaults (or a preset)
//! 2. A TOML or JSON settings file
//! 3. Environment variables (`KEEL__SECTION__KEY`)
//!
//! # Environment Variable Format
//!
//! Variables use double underscores between the prefix, the section and
//! the key:
//!
//! - `KEEL__PIPELINE__DEFAULT_TARGETS=frontend,backend,edge`
//! - `KEEL__PIPELINE__MAX_EXPRESSION_DEPTH=16`
//! - `KEEL__LOGGING__FORMAT=json`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use keel_core::TargetId;

use crate::error::SettingsError;
use crate::settings::KeelSettings;
use crate::SettingsResult;

/// Prefix used when [`SettingsLoader::with_env_prefix`] is not called.
pub const DEFAULT_ENV_PREFIX: &str = "KEEL";

/// Builder for loading [`KeelSettings`].
///
/// # Example
///
/// ```no_run
/// use keel_config::SettingsLoader;
///
/// let settings = SettingsLoader::new()
///     .with_optional_file("keel.toml")?
///     .with_env()
///     .load()?;
/// # Ok::<(), keel_config::SettingsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    settings: KeelSettings,
    env_prefix: Option<String>,
    dotenv: bool,
}

impl SettingsLoader {
    /// Creates a loader starting from the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: KeelSettings::default(),
            env_prefix: None,
            dotenv: false,
        }
    }

    /// Resets to the default settings.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.settings = KeelSettings::default();
        self
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.settings = KeelSettings::development();
        self
    }

    /// Starts from the CI preset.
    #[must_use]
    pub fn with_ci(mut self) -> Self {
        self.settings = KeelSettings::ci();
        self
    }

    /// Loads settings from a file, detecting the format by extension.
    ///
    /// Sections missing from the file take their default values.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::file_not_found(path));
        }

        let content =
            fs::read_to_string(path).map_err(|e| SettingsError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.settings = parse(&content, &format)?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> SettingsResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            tracing::trace!(path = %path.as_ref().display(), "no settings file");
            Ok(self)
        }
    }

    /// Loads settings from a string in the given format (`toml` or `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> SettingsResult<Self> {
        self.settings = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables environment overrides with the default `KEEL` prefix.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Enables environment overrides with a custom prefix.
    ///
    /// The prefix is upper-cased.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into().to_uppercase());
        self
    }

    /// Reads a `.env` file into the process environment before applying
    /// overrides. A missing `.env` file is not an error.
    #[must_use]
    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = true;
        self
    }

    /// Applies overrides from explicit variables instead of the process
    /// environment.
    ///
    /// Uses the configured prefix, or `KEEL` if none was set.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> SettingsResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = self
            .env_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string());
        for (key, value) in vars {
            self.apply_env_var(&prefix, key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Applies environment overrides and validates the result.
    pub fn load(self) -> SettingsResult<KeelSettings> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies environment overrides without validating.
    pub fn load_unvalidated(mut self) -> SettingsResult<KeelSettings> {
        if self.dotenv {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    tracing::warn!(error = %e, "failed to read .env file");
                }
            }
        }

        if let Some(prefix) = self.env_prefix.clone() {
            // Non-Unicode variables cannot carry settings; skip them.
            let vars = env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
            for (key, value) in vars {
                self.apply_env_var(&prefix, &key, &value)?;
            }
        }

        Ok(self.settings)
    }

    fn apply_env_var(&mut self, prefix: &str, key: &str, value: &str) -> SettingsResult<()> {
        let Some(rest) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let pipeline = &mut self.settings.pipeline;
        let logging = &mut self.settings.logging;

        match parts.as_slice() {
            ["PIPELINE", "DEFAULT_TARGETS"] => {
                pipeline.default_targets = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(TargetId::from)
                    .collect();
            }
            ["PIPELINE", "SNAPSHOT_ENV"] => {
                pipeline.snapshot_env = parse_bool(value)
                    .ok_or_else(|| SettingsError::env_parse_error(key, "expected boolean"))?;
            }
            ["PIPELINE", "RUNTIME_ROOT"] => {
                pipeline.runtime_root = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["PIPELINE", "MAX_EXPRESSION_DEPTH"] => {
                pipeline.max_expression_depth = value
                    .parse()
                    .map_err(|_| SettingsError::env_parse_error(key, "expected integer"))?;
            }
            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| SettingsError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                logging.format = value.to_lowercase();
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                logging.span_events = parse_bool(value)
                    .ok_or_else(|| SettingsError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                logging.file_line_info = parse_bool(value)
                    .ok_or_else(|| SettingsError::env_parse_error(key, "expected boolean"))?;
            }
            _ => {
                tracing::warn!(var = key, "ignoring unknown settings variable");
            }
        }

        Ok(())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(content: &str, format: &str) -> SettingsResult<KeelSettings> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(SettingsError::unsupported_format(other)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
