//! Named transforms that extend the expression language.
//!
//! A transform is invoked with the pipe syntax: `value | name(arg, ...)`.
//! It receives the piped value, the evaluated arguments and a
//! [`TransformScope`] through which it can evaluate further expressions
//! against the record being resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keel_core::value::{kind_name, to_display_string};
use keel_core::{ConfigRecord, ConfigValue};

use crate::error::{ExprResult, ExpressionError};
use crate::eval::Resolution;
use crate::path::ValuePath;
use crate::template::has_expression;

/// Name under which the configuration pipeline registers [`eval`].
pub const EVAL_TRANSFORM: &str = "eval";

/// A type-erased transform function.
pub type TransformFn = dyn Fn(&mut TransformScope<'_, '_>, ConfigValue, Vec<ConfigValue>) -> ExprResult<ConfigValue>
    + Send
    + Sync;

/// Access to the running resolution, handed to every transform call.
pub struct TransformScope<'s, 'r> {
    resolution: &'s mut Resolution<'r>,
}

impl<'s, 'r> TransformScope<'s, 'r> {
    pub(crate) fn new(resolution: &'s mut Resolution<'r>) -> Self {
        Self { resolution }
    }

    /// Evaluates `text` against the record being resolved.
    ///
    /// Text containing `${ ... }` is treated as a template; anything else is
    /// parsed as a bare expression.
    pub fn evaluate(&mut self, text: &str) -> ExprResult<ConfigValue> {
        if has_expression(text) {
            self.resolution.eval_template(text)
        } else {
            self.resolution.eval_source(text)
        }
    }

    /// Reads (and if necessary resolves) the value at a dotted path.
    pub fn lookup(&mut self, path: &str) -> ExprResult<ConfigValue> {
        self.resolution.lookup(&ValuePath::parse_dotted(path))
    }

    /// The record being resolved.
    pub fn record(&self) -> &ConfigRecord {
        self.resolution.record()
    }
}

/// The set of transforms available to one resolver.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Arc<TransformFn>>,
}

impl TransformRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the pure built-in transforms:
    /// `upper`, `lower`, `trim`, `json` and `default`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("upper", upper);
        registry.register("lower", lower);
        registry.register("trim", trim);
        registry.register("json", json);
        registry.register("default", default);
        registry
    }

    /// Registers `transform` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&mut TransformScope<'_, '_>, ConfigValue, Vec<ConfigValue>) -> ExprResult<ConfigValue>
            + Send
            + Sync
            + 'static,
    {
        self.transforms.insert(name.into(), Arc::new(transform));
    }

    /// Returns the transform registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TransformFn> {
        self.transforms.get(name).map(AsRef::as_ref)
    }

    /// Returns whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn expect_string(name: &str, value: ConfigValue) -> ExprResult<String> {
    match value {
        ConfigValue::String(s) => Ok(s),
        other => Err(ExpressionError::transform(
            name,
            format!("expected a string, got {}", kind_name(&other)),
        )),
    }
}

/// Evaluates its input string as a fresh expression against the same record.
///
/// `'${a}-${b}' | eval` evaluates the template; `'a + 1' | eval` evaluates
/// the bare expression.
pub fn eval(
    scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    _args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    let text = expect_string(EVAL_TRANSFORM, input)?;
    scope.evaluate(&text)
}

fn upper(
    _scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    _args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    Ok(ConfigValue::String(expect_string("upper", input)?.to_uppercase()))
}

fn lower(
    _scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    _args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    Ok(ConfigValue::String(expect_string("lower", input)?.to_lowercase()))
}

fn trim(
    _scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    _args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    Ok(ConfigValue::String(
        expect_string("trim", input)?.trim().to_string(),
    ))
}

fn json(
    _scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    _args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    Ok(ConfigValue::String(input.to_string()))
}

/// `value | default(fallback)`: the fallback when the value is null or empty.
fn default(
    _scope: &mut TransformScope<'_, '_>,
    input: ConfigValue,
    args: Vec<ConfigValue>,
) -> ExprResult<ConfigValue> {
    let missing = match &input {
        ConfigValue::Null => true,
        ConfigValue::String(s) => s.is_empty(),
        _ => false,
    };
    if !missing {
        return Ok(input);
    }
    args.into_iter().next().ok_or_else(|| {
        ExpressionError::transform(
            "default",
            format!(
                "expected a fallback argument for `{}`",
                to_display_string(&input)
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = TransformRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["default", "json", "lower", "trim", "upper"]);
        assert!(!registry.contains(EVAL_TRANSFORM));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TransformRegistry::new();
        registry.register("x", |_scope, input, _args| Ok(input));
        registry.register("x", |_scope, _input, _args| Ok(ConfigValue::Null));
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn test_debug_lists_names() {
        let registry = TransformRegistry::with_builtins();
        assert!(format!("{registry:?}").contains("upper"));
    }
}
