//! Program metadata and CLI options supplied by the argument parser.

use serde::{Deserialize, Serialize};

use crate::{ConfigMap, ConfigValue, TargetId};

/// Metadata about the running command-line program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfo {
    /// Program name (e.g. `keel`).
    pub name: String,

    /// Program version.
    pub version: String,

    /// Short description shown in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw arguments the program was invoked with.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProgramInfo {
    /// Creates program metadata with no arguments.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            args: Vec::new(),
        }
    }

    /// Sets the raw arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Parsed command-line options.
///
/// `mode` and `targets` are understood by Keel; anything else the parser
/// produced travels in `extra` and is handed to hooks untouched.
///
/// # Example
///
/// ```
/// use keel_core::{CliOptions, ProgramInfo};
/// use serde_json::json;
///
/// let options = CliOptions::new()
///     .with_mode(["dev"])
///     .with_option("port", json!(3000));
/// let program = ProgramInfo::new("keel", "0.1.0");
///
/// let merged = options.merged_with(&program);
/// assert_eq!(merged["name"], "keel");
/// assert_eq!(merged["port"], 3000);
/// assert_eq!(merged["mode"], json!(["dev"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliOptions {
    /// Active modes (e.g. `dev`, `test`).
    #[serde(default)]
    pub mode: Vec<String>,

    /// Targets explicitly requested on the command line.
    #[serde(default)]
    pub targets: Vec<TargetId>,

    /// Every other option, keyed by its long name.
    #[serde(default, flatten)]
    pub extra: ConfigMap,
}

impl CliOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active modes.
    #[must_use]
    pub fn with_mode<I, S>(mut self, mode: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mode = mode.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the requested targets.
    #[must_use]
    pub fn with_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetId>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a passthrough option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns a passthrough option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.extra.get(key)
    }

    /// Returns the options as an object value.
    #[must_use]
    pub fn to_value(&self) -> ConfigValue {
        serde_json::to_value(self).unwrap_or_else(|_| ConfigValue::Object(self.extra.clone()))
    }

    /// Merges the options over the program metadata.
    ///
    /// Options win when both define the same key.
    #[must_use]
    pub fn merged_with(&self, program: &ProgramInfo) -> ConfigValue {
        let mut merged = match serde_json::to_value(program) {
            Ok(ConfigValue::Object(map)) => map,
            _ => ConfigMap::new(),
        };
        if let ConfigValue::Object(options) = self.to_value() {
            merged.extend(options);
        }
        ConfigValue::Object(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_override_program() {
        let program = ProgramInfo::new("keel", "0.1.0").with_args(["serve"]);
        let options = CliOptions::new().with_option("version", json!("override"));

        let merged = options.merged_with(&program);

        assert_eq!(merged["version"], json!("override"));
        assert_eq!(merged["args"], json!(["serve"]));
        assert_eq!(merged["targets"], json!([]));
    }

    #[test]
    fn test_extra_flattened() {
        let options = CliOptions::new()
            .with_targets(["backend"])
            .with_option("open", json!(true));
        let value = options.to_value();
        assert_eq!(value["open"], json!(true));
        assert_eq!(value["targets"], json!(["backend"]));
    }
}
