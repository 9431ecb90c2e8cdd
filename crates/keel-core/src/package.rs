//! Package descriptor supplied by the package-loading collaborator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigMap, ConfigValue};

/// Metadata about the application package being configured.
///
/// The descriptor is parsed elsewhere (typically from a package manifest);
/// Keel only snapshots it into each target's record as the `pkg` field and
/// hands it to hooks.
///
/// # Example
///
/// ```
/// use keel_core::PackageDescriptor;
///
/// let pkg = PackageDescriptor::new("demo-app", "1.2.0", "/work/demo-app");
/// let value = pkg.to_value();
/// assert_eq!(value["name"], "demo-app");
/// assert_eq!(value["version"], "1.2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package name.
    pub name: String,

    /// Package version.
    pub version: String,

    /// Directory containing the package.
    pub root_path: PathBuf,

    /// Active modes (e.g. `dev`, `prod`) the package was loaded for.
    #[serde(default)]
    pub modes: Vec<String>,

    /// The raw manifest object, as parsed by the loader.
    #[serde(default)]
    pub manifest: ConfigMap,
}

impl PackageDescriptor {
    /// Creates a descriptor with an empty manifest.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        root_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            root_path: root_path.into(),
            modes: Vec::new(),
            manifest: ConfigMap::new(),
        }
    }

    /// Sets the raw manifest object.
    #[must_use]
    pub fn with_manifest(mut self, manifest: ConfigMap) -> Self {
        self.manifest = manifest;
        self
    }

    /// Sets the active modes.
    #[must_use]
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the package root.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Snapshot of the package as a configuration value.
    ///
    /// The manifest fields come first; `name` and `version` always reflect
    /// the descriptor.
    #[must_use]
    pub fn to_value(&self) -> ConfigValue {
        let mut map = self.manifest.clone();
        map.insert("name".to_string(), ConfigValue::String(self.name.clone()));
        map.insert(
            "version".to_string(),
            ConfigValue::String(self.version.clone()),
        );
        ConfigValue::Object(map)
    }
}
