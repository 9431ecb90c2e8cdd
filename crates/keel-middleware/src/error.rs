//! Middleware error types.

use keel_core::BoxError;
use thiserror::Error;

/// Result type returned by middleware units and chains.
pub type MiddlewareResult = Result<(), MiddlewareError>;

/// Misuse of the continuation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MiddlewareProtocolError {
    /// A unit invoked its continuation more than once.
    #[error("next invoked more than once (position {position})")]
    NextCalledMultipleTimes {
        /// The position the repeated call tried to enter.
        position: usize,
    },

    /// Dispatch was asked for a position past the terminal handler.
    #[error("dispatch position {position} is past the end of a chain of {len} units")]
    PositionOutOfRange {
        /// The requested position.
        position: usize,
        /// Number of units in the chain.
        len: usize,
    },
}

/// Errors surfaced by a middleware chain.
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// The continuation protocol was violated.
    #[error(transparent)]
    Protocol(#[from] MiddlewareProtocolError),

    /// A unit failed; the error is propagated unchanged.
    #[error(transparent)]
    Unhandled(BoxError),
}

impl MiddlewareError {
    /// Wraps a unit's own failure.
    pub fn unhandled(error: impl Into<BoxError>) -> Self {
        Self::Unhandled(error.into())
    }

    /// Returns the protocol violation, if this is one.
    pub const fn protocol(&self) -> Option<&MiddlewareProtocolError> {
        match self {
            Self::Protocol(err) => Some(err),
            Self::Unhandled(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_display() {
        let err = MiddlewareError::from(MiddlewareProtocolError::NextCalledMultipleTimes {
            position: 2,
        });
        assert_eq!(err.to_string(), "next invoked more than once (position 2)");
        assert!(err.protocol().is_some());
    }

    #[test]
    fn test_unhandled_is_transparent() {
        let err = MiddlewareError::unhandled("database unavailable");
        assert_eq!(err.to_string(), "database unavailable");
        assert!(err.protocol().is_none());
    }
}
