//! The multi-target configuration container.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConfigRecord, ConfigValue, TargetId};

/// Configuration records for every deployment target.
///
/// Targets keep the order in which they were first added.
///
/// # Example
///
/// ```
/// use keel_core::{ApplicationConfig, TargetId};
/// use serde_json::json;
///
/// let mut cfg = ApplicationConfig::new();
/// cfg.get_config(&TargetId::backend()).insert("port", json!(3000));
///
/// assert_eq!(
///     cfg.get(&TargetId::backend()).and_then(|r| r.get("port")),
///     Some(&json!(3000)),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationConfig {
    targets: IndexMap<TargetId, ConfigRecord>,
}

impl ApplicationConfig {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `target`, creating an empty one if absent.
    pub fn get_config(&mut self, target: &TargetId) -> &mut ConfigRecord {
        self.targets.entry(target.clone()).or_default()
    }

    /// Returns the record for `target`, if any.
    #[must_use]
    pub fn get(&self, target: &TargetId) -> Option<&ConfigRecord> {
        self.targets.get(target)
    }

    /// Removes the record for `target`, returning an empty record if absent.
    ///
    /// The target keeps its position if it is inserted again.
    pub fn take(&mut self, target: &TargetId) -> ConfigRecord {
        self.targets
            .get_mut(target)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Inserts or replaces the record for `target`.
    pub fn insert(&mut self, target: TargetId, record: ConfigRecord) -> Option<ConfigRecord> {
        self.targets.insert(target, record)
    }

    /// Returns the known targets in order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.keys()
    }

    /// Iterates over targets and their records.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &ConfigRecord)> {
        self.targets.iter()
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns whether no target has a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the whole container as an object value keyed by target.
    #[must_use]
    pub fn to_value(&self) -> ConfigValue {
        ConfigValue::Object(
            self.targets
                .iter()
                .map(|(target, record)| (target.to_string(), record.to_value()))
                .collect(),
        )
    }

    /// Consumes the container.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<TargetId, ConfigRecord> {
        self.targets
    }
}

impl FromIterator<(TargetId, ConfigRecord)> for ApplicationConfig {
    fn from_iter<I: IntoIterator<Item = (TargetId, ConfigRecord)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_keeps_position() {
        let mut cfg = ApplicationConfig::new();
        cfg.get_config(&TargetId::frontend()).insert("a", json!(1));
        cfg.get_config(&TargetId::backend()).insert("b", json!(2));

        let record = cfg.take(&TargetId::frontend());
        assert_eq!(record.get("a"), Some(&json!(1)));
        cfg.insert(TargetId::frontend(), record);

        let order: Vec<_> = cfg.targets().map(TargetId::as_str).collect();
        assert_eq!(order, vec!["frontend", "backend"]);
    }

    #[test]
    fn test_take_missing_is_empty() {
        let mut cfg = ApplicationConfig::new();
        assert!(cfg.take(&TargetId::from("edge")).is_empty());
    }

    #[test]
    fn test_to_value() {
        let mut cfg = ApplicationConfig::new();
        cfg.get_config(&TargetId::backend()).insert("port", json!(80));
        assert_eq!(cfg.to_value(), json!({"backend": {"port": 80}}));
    }
}
