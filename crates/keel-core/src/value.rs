//! Configuration value types.
//!
//! Configuration is heterogeneous: a value may be a string, number, boolean,
//! nested mapping or nested sequence. Keel represents it with
//! [`serde_json::Value`], built with `preserve_order` so mappings keep the
//! order in which keys were inserted.

/// A single configuration value.
pub type ConfigValue = serde_json::Value;

/// An ordered mapping from string keys to configuration values.
pub type ConfigMap = serde_json::Map<String, ConfigValue>;

/// Returns a short, human-readable name for the variant of `value`.
///
/// Used in error messages.
///
/// # Example
///
/// ```
/// use keel_core::value::kind_name;
/// use serde_json::json;
///
/// assert_eq!(kind_name(&json!("a")), "string");
/// assert_eq!(kind_name(&json!({"a": 1})), "object");
/// ```
#[must_use]
pub const fn kind_name(value: &ConfigValue) -> &'static str {
    match value {
        ConfigValue::Null => "null",
        ConfigValue::Bool(_) => "boolean",
        ConfigValue::Number(_) => "number",
        ConfigValue::String(_) => "string",
        ConfigValue::Array(_) => "array",
        ConfigValue::Object(_) => "object",
    }
}

/// Returns whether `value` counts as "true" in a boolean position.
///
/// `null`, `false`, `0`, `NaN` and the empty string are falsy; everything
/// else (including empty arrays and objects) is truthy.
#[must_use]
pub fn is_truthy(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Null => false,
        ConfigValue::Bool(b) => *b,
        ConfigValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        ConfigValue::String(s) => !s.is_empty(),
        ConfigValue::Array(_) | ConfigValue::Object(_) => true,
    }
}

/// Renders `value` the way it appears when interpolated into a string.
///
/// Strings are inserted verbatim, `null` renders as the empty string, and
/// arrays and objects render as compact JSON.
#[must_use]
pub fn to_display_string(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Null => String::new(),
        ConfigValue::String(s) => s.clone(),
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Number(n) => n.to_string(),
        ConfigValue::Array(_) | ConfigValue::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_display_string() {
        assert_eq!(to_display_string(&json!(null)), "");
        assert_eq!(to_display_string(&json!("abc")), "abc");
        assert_eq!(to_display_string(&json!(8080)), "8080");
        assert_eq!(to_display_string(&json!([1, 2])), "[1,2]");
    }
}
