//! Deployment target identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of the browser-side deployment target.
pub const FRONTEND_TARGET: &str = "frontend";

/// Identifier of the server-side deployment target.
pub const BACKEND_TARGET: &str = "backend";

/// A deployment context for which a distinct configuration is resolved.
///
/// # Example
///
/// ```
/// use keel_core::TargetId;
///
/// let target = TargetId::frontend();
/// assert_eq!(target.as_str(), "frontend");
/// assert_eq!(TargetId::from("edge").to_string(), "edge");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `frontend` target.
    #[must_use]
    pub fn frontend() -> Self {
        Self::new(FRONTEND_TARGET)
    }

    /// The `backend` target.
    #[must_use]
    pub fn backend() -> Self {
        Self::new(BACKEND_TARGET)
    }

    /// The targets resolved when the caller names none.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::frontend(), Self::backend()]
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
