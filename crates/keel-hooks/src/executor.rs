//! Sequential execution of the hooks registered for a phase.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::error::HookExecutionError;
use crate::phase::HookPhase;
use crate::record::ExecutionRecord;
use crate::registry::HookRegistry;

/// Runs the hooks of a phase one after another.
///
/// Hooks run in registration order. Each hook's future is awaited to
/// completion before the next hook starts, and all of them see the same
/// [`ExecutionRecord`]. The first failure stops the phase.
#[derive(Debug, Clone, Default)]
pub struct HookExecutor {
    registry: Arc<HookRegistry>,
}

impl HookExecutor {
    /// Creates an executor over `registry`.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// The registry hooks are read from.
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Runs every hook registered for `phase`.
    ///
    /// A phase with no hooks completes immediately.
    pub async fn execute_hooks(
        &self,
        record: &mut ExecutionRecord,
        phase: &HookPhase,
    ) -> Result<(), HookExecutionError> {
        let hooks = self.registry.hooks(phase);
        if hooks.is_empty() {
            tracing::trace!(phase = %phase, target = %record.target, "no hooks registered");
            return Ok(());
        }

        tracing::debug!(
            phase = %phase,
            target = %record.target,
            count = hooks.len(),
            "executing hooks"
        );

        for (position, registration) in hooks.iter().enumerate() {
            let hook = registration.hook();
            let span = tracing::debug_span!(
                "hook",
                phase = %phase,
                extension = registration.extension(),
                hook = hook.name(),
                position
            );
            let start = Instant::now();
            let outcome = hook.call(record).instrument(span).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            if let Err(source) = outcome {
                tracing::warn!(
                    phase = %phase,
                    extension = registration.extension(),
                    hook = hook.name(),
                    elapsed_ms,
                    error = %source,
                    "hook failed"
                );
                return Err(HookExecutionError::new(
                    phase.clone(),
                    registration.extension(),
                    hook.name(),
                    source,
                ));
            }
            tracing::trace!(hook = hook.name(), elapsed_ms, "hook completed");
        }
        Ok(())
    }

    /// Runs the [`HookPhase::Init`] hooks.
    pub async fn execute_init_hooks(
        &self,
        record: &mut ExecutionRecord,
    ) -> Result<(), HookExecutionError> {
        self.execute_hooks(record, &HookPhase::Init).await
    }
}
