//! The public entry point for evaluating expressions.

use std::fmt;

use keel_core::{ConfigRecord, ConfigValue};

use crate::error::ExprResult;
use crate::eval::Resolution;
use crate::transform::{TransformRegistry, TransformScope};

/// Default limit on nested template evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Evaluates `${ ... }` expressions against a [`ConfigRecord`].
///
/// The resolver owns the transforms available to expressions. Evaluation is
/// synchronous and writes resolved dependencies back into the record, so a
/// field referenced by several others is evaluated once.
///
/// # Example
///
/// ```
/// use keel_core::ConfigRecord;
/// use keel_expr::ExpressionResolver;
/// use serde_json::json;
///
/// let mut record = ConfigRecord::new();
/// record.insert("host", json!("localhost"));
/// record.insert("port", json!(8080));
/// record.insert("url", json!("http://${host}:${port}"));
///
/// ExpressionResolver::new().resolve_all(&mut record).unwrap();
/// assert_eq!(record.get("url"), Some(&json!("http://localhost:8080")));
/// ```
#[derive(Clone)]
pub struct ExpressionResolver {
    transforms: TransformRegistry,
    max_depth: usize,
}

impl ExpressionResolver {
    /// Creates a resolver with the built-in transforms.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transforms(TransformRegistry::with_builtins())
    }

    /// Creates a resolver with no transforms registered.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_transforms(TransformRegistry::new())
    }

    /// Creates a resolver over an existing registry.
    #[must_use]
    pub fn with_transforms(transforms: TransformRegistry) -> Self {
        Self {
            transforms,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// The nesting limit.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Registers a transform, replacing any existing one with the same name.
    pub fn register_transform<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&mut TransformScope<'_, '_>, ConfigValue, Vec<ConfigValue>) -> ExprResult<ConfigValue>
            + Send
            + Sync
            + 'static,
    {
        self.transforms.register(name, transform);
    }

    /// Returns whether a transform is registered under `name`.
    #[must_use]
    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains(name)
    }

    /// The registered transforms.
    #[must_use]
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Evaluates a template string against `record`.
    ///
    /// Text without `${` is returned unchanged as a string. Referenced fields
    /// are resolved in place.
    pub fn evaluate(&self, text: &str, record: &mut ConfigRecord) -> ExprResult<ConfigValue> {
        Resolution::new(record, &self.transforms, self.max_depth).eval_template(text)
    }

    /// Evaluates a bare expression such as `port + 1` against `record`.
    pub fn evaluate_expression(
        &self,
        source: &str,
        record: &mut ConfigRecord,
    ) -> ExprResult<ConfigValue> {
        Resolution::new(record, &self.transforms, self.max_depth).eval_source(source)
    }

    /// Resolves every expression in `record`.
    ///
    /// Fields marked as ignored are left untouched. Every resolved value is
    /// final: it is never evaluated again, including by a later call, so
    /// resolving twice is the same as resolving once. On error the record may
    /// be partially resolved.
    pub fn resolve_all(&self, record: &mut ConfigRecord) -> ExprResult<()> {
        tracing::debug!(fields = record.len(), "resolving record expressions");
        Resolution::new(record, &self.transforms, self.max_depth).resolve_all()
    }
}

impl Default for ExpressionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpressionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionResolver")
            .field("transforms", &self.transforms)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
