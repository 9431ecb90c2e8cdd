//! Hook execution errors.

use keel_core::BoxError;
use thiserror::Error;

use crate::phase::HookPhase;

/// A hook failed; the remaining hooks of the phase were not run.
#[derive(Debug, Error)]
#[error("hook `{hook}` from extension `{extension}` failed during {phase}: {source}")]
pub struct HookExecutionError {
    /// The phase being executed.
    pub phase: HookPhase,
    /// The extension that registered the failing hook.
    pub extension: String,
    /// The failing hook's name.
    pub hook: String,
    /// The hook's own error.
    #[source]
    pub source: BoxError,
}

impl HookExecutionError {
    /// Create a new hook execution error.
    pub fn new(
        phase: HookPhase,
        extension: impl Into<String>,
        hook: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            phase,
            extension: extension.into(),
            hook: hook.into(),
            source: source.into(),
        }
    }
}
