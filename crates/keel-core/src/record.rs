//! Per-target configuration records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{ConfigMap, ConfigValue};

/// Environment snapshot injected before hooks run.
pub const ENV_FIELD: &str = "env";

/// Package descriptor snapshot injected before hooks run.
pub const PKG_FIELD: &str = "pkg";

/// Absolute resolution root injected before hooks run.
pub const CURRENT_RUNTIME_PATH_FIELD: &str = "currentRuntimePath";

/// Merged CLI options and program metadata injected before hooks run.
pub const CLI_CONTEXT_FIELD: &str = "cliContext";

/// Fields that exist only while a record is being resolved.
pub const TRANSIENT_FIELDS: [&str; 4] = [
    ENV_FIELD,
    PKG_FIELD,
    CURRENT_RUNTIME_PATH_FIELD,
    CLI_CONTEXT_FIELD,
];

/// Configuration for a single deployment target.
///
/// A record is a mapping from string keys to [`ConfigValue`]s. While the
/// configuration pipeline runs, ambient data (environment, package metadata,
/// CLI context) is injected as *transient* fields. Transient fields carry an
/// ignore marker: the expression resolver reads them but never rewrites them,
/// and [`strip_transient`](Self::strip_transient) removes them before the
/// record leaves the pipeline.
///
/// The resolver also records which paths it has already resolved so a later
/// pass leaves their values alone, even when a value looks like an
/// expression. Replacing or removing a top-level field through the record
/// forgets the marks under it.
///
/// Serialization only covers the fields; the ignore and resolved markers are
/// runtime state.
///
/// # Example
///
/// ```
/// use keel_core::{ConfigRecord, ENV_FIELD};
/// use serde_json::json;
///
/// let mut record = ConfigRecord::new();
/// record.insert("port", json!(8080));
/// record.inject_transient(ENV_FIELD, json!({"HOME": "/root"}));
///
/// assert!(record.is_ignored(ENV_FIELD));
/// record.strip_transient();
/// assert!(record.get(ENV_FIELD).is_none());
/// assert_eq!(record.get("port"), Some(&json!(8080)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigMap", into = "ConfigMap")]
pub struct ConfigRecord {
    fields: ConfigMap,
    ignored: BTreeSet<String>,
    resolved: BTreeMap<String, BTreeSet<String>>,
}

impl ConfigRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.fields.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// The value may be rewritten, so resolved marks under `key` are dropped.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.resolved.remove(key);
        self.fields.get_mut(key)
    }

    /// Looks up a dotted path such as `server.ports.0`.
    ///
    /// Numeric segments index into arrays; every other segment is an object
    /// key.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                ConfigValue::Object(map) => map.get(segment)?,
                ConfigValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        let key = key.into();
        self.resolved.remove(&key);
        self.fields.insert(key, value)
    }

    /// Removes `key` (and its markers), returning the previous value.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.ignored.remove(key);
        self.resolved.remove(key);
        self.fields.shift_remove(key)
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.fields.iter()
    }

    /// Inserts `value` under `key` and marks it as ignored for expression
    /// resolution.
    pub fn inject_transient(&mut self, key: impl Into<String>, value: ConfigValue) {
        let key = key.into();
        self.ignored.insert(key.clone());
        self.resolved.remove(&key);
        self.fields.insert(key, value);
    }

    /// Returns whether `key` carries the ignore marker.
    #[must_use]
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored.contains(key)
    }

    /// Returns the keys that currently carry the ignore marker.
    pub fn ignored_keys(&self) -> impl Iterator<Item = &str> {
        self.ignored.iter().map(String::as_str)
    }

    /// Records that the value at `path`, a location under the top-level
    /// field `key`, is the final result of an expression.
    pub fn mark_resolved(&mut self, key: &str, path: impl Into<String>) {
        self.resolved
            .entry(key.to_string())
            .or_default()
            .insert(path.into());
    }

    /// Returns whether `path` under `key` was marked by
    /// [`mark_resolved`](Self::mark_resolved).
    #[must_use]
    pub fn is_resolved(&self, key: &str, path: &str) -> bool {
        self.resolved
            .get(key)
            .is_some_and(|paths| paths.contains(path))
    }

    /// Returns whether any path under `key` is marked as resolved.
    #[must_use]
    pub fn has_resolved(&self, key: &str) -> bool {
        self.resolved.contains_key(key)
    }

    /// Removes the four well-known transient fields and every other
    /// ignore-marked field.
    pub fn strip_transient(&mut self) {
        for key in TRANSIENT_FIELDS {
            self.fields.shift_remove(key);
            self.resolved.remove(key);
        }
        for key in std::mem::take(&mut self.ignored) {
            self.fields.shift_remove(&key);
            self.resolved.remove(&key);
        }
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn as_map(&self) -> &ConfigMap {
        &self.fields
    }

    /// Returns the underlying field map for in-place rewriting.
    ///
    /// Ignore and resolved markers are keyed by name and survive edits made
    /// through this reference.
    pub fn as_map_mut(&mut self) -> &mut ConfigMap {
        &mut self.fields
    }

    /// Consumes the record, returning its fields.
    #[must_use]
    pub fn into_map(self) -> ConfigMap {
        self.fields
    }

    /// Returns the record as an object value.
    #[must_use]
    pub fn to_value(&self) -> ConfigValue {
        ConfigValue::Object(self.fields.clone())
    }
}

impl From<ConfigMap> for ConfigRecord {
    fn from(fields: ConfigMap) -> Self {
        Self {
            fields,
            ignored: BTreeSet::new(),
            resolved: BTreeMap::new(),
        }
    }
}

impl From<ConfigRecord> for ConfigMap {
    fn from(record: ConfigRecord) -> Self {
        record.fields
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigRecord {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<ConfigMap>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigRecord {
        match json!({
            "server": {"port": 8080, "hosts": ["a", "b"]},
            "name": "app"
        }) {
            ConfigValue::Object(map) => ConfigRecord::from(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_get_path() {
        let record = sample();
        assert_eq!(record.get_path("server.port"), Some(&json!(8080)));
        assert_eq!(record.get_path("server.hosts.1"), Some(&json!("b")));
        assert_eq!(record.get_path("server.hosts.9"), None);
        assert_eq!(record.get_path("name.length"), None);
        assert_eq!(record.get_path("missing"), None);
    }

    #[test]
    fn test_strip_transient_removes_all_markers() {
        let mut record = sample();
        for key in TRANSIENT_FIELDS {
            record.inject_transient(key, json!({"x": 1}));
        }
        record.inject_transient("extra", json!(true));
        assert_eq!(record.ignored_keys().count(), 5);

        record.strip_transient();

        for key in TRANSIENT_FIELDS {
            assert!(!record.contains_key(key));
        }
        assert!(!record.contains_key("extra"));
        assert_eq!(record.ignored_keys().count(), 0);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_strip_transient_without_marker() {
        let mut record = sample();
        record.insert(ENV_FIELD, json!("plain insert"));
        record.strip_transient();
        assert!(!record.contains_key(ENV_FIELD));
    }

    #[test]
    fn test_remove_clears_marker() {
        let mut record = ConfigRecord::new();
        record.inject_transient(PKG_FIELD, json!({}));
        record.remove(PKG_FIELD);
        assert!(!record.is_ignored(PKG_FIELD));
    }

    #[test]
    fn test_resolved_marks_follow_field_writes() {
        let mut record = sample();
        record.mark_resolved("server", "server.port");
        record.mark_resolved("name", "name");
        assert!(record.is_resolved("server", "server.port"));
        assert!(!record.is_resolved("server", "server"));

        record.insert("server", json!("${host}"));
        assert!(!record.has_resolved("server"));

        record.get_mut("name");
        assert!(!record.is_resolved("name", "name"));

        record.mark_resolved(ENV_FIELD, ENV_FIELD);
        record.strip_transient();
        assert!(!record.has_resolved(ENV_FIELD));
    }

    #[test]
    fn test_serializes_fields_only() {
        let mut record = sample();
        record.inject_transient(ENV_FIELD, json!({}));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["server"]["port"], json!(8080));
        assert!(value.get(ENV_FIELD).is_some());

        let back: ConfigRecord = serde_json::from_value(value).unwrap();
        assert!(!back.is_ignored(ENV_FIELD));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut record = ConfigRecord::new();
        record.insert("z", json!(1));
        record.insert("a", json!(2));
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
