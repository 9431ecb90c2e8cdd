//! Expression error types.

use thiserror::Error;

/// Result type alias using [`ExpressionError`].
pub type ExprResult<T> = Result<T, ExpressionError>;

/// Errors that can occur while parsing or evaluating expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    /// The expression text is malformed.
    #[error("syntax error in `{expression}` at offset {offset}: {message}")]
    Syntax {
        /// The expression source.
        expression: String,
        /// Byte offset of the offending token.
        offset: usize,
        /// What the parser expected.
        message: String,
    },

    /// A `${` was never closed.
    #[error("unterminated expression in `{text}`")]
    UnterminatedTemplate {
        /// The template text.
        text: String,
    },

    /// An expression piped into a transform that is not registered.
    #[error("unknown transform `{name}`")]
    UnknownTransform {
        /// The transform name.
        name: String,
    },

    /// A transform rejected its input.
    #[error("transform `{name}` failed: {message}")]
    Transform {
        /// The transform name.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// An operator was applied to values it does not support.
    #[error("type error: {message}")]
    Type {
        /// Description of the mismatch.
        message: String,
    },

    /// Resolving a field required the field itself.
    #[error("circular reference while resolving `{path}` ({chain})")]
    CircularReference {
        /// The field whose resolution re-entered itself.
        path: String,
        /// The dependency chain that closed the cycle.
        chain: String,
    },

    /// Nested evaluation went deeper than allowed.
    #[error("expression nesting exceeded the maximum depth of {max_depth}")]
    DepthExceeded {
        /// The configured limit.
        max_depth: usize,
    },
}

impl ExpressionError {
    /// Create a new syntax error.
    pub fn syntax(
        expression: impl Into<String>,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            expression: expression.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create a new unterminated template error.
    pub fn unterminated(text: impl Into<String>) -> Self {
        Self::UnterminatedTemplate { text: text.into() }
    }

    /// Create a new unknown transform error.
    pub fn unknown_transform(name: impl Into<String>) -> Self {
        Self::UnknownTransform { name: name.into() }
    }

    /// Create a new transform failure.
    pub fn transform(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// Create a new circular reference error.
    pub fn circular(path: impl Into<String>, chain: impl Into<String>) -> Self {
        Self::CircularReference {
            path: path.into(),
            chain: chain.into(),
        }
    }

    /// Returns true if this error reports a dependency cycle.
    #[must_use]
    pub const fn is_circular(&self) -> bool {
        matches!(self, Self::CircularReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error() {
        let err = ExpressionError::syntax("a +", 3, "expected operand");
        assert!(err.to_string().contains("a +"));
        assert!(err.to_string().contains("offset 3"));
    }

    #[test]
    fn test_circular_error() {
        let err = ExpressionError::circular("a", "a -> b -> a");
        assert!(err.is_circular());
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_transform_error() {
        let err = ExpressionError::transform("upper", "expected a string");
        assert_eq!(
            err.to_string(),
            "transform `upper` failed: expected a string"
        );
    }
}
