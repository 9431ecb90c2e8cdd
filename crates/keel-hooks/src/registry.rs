//! Ordered hook registrations keyed by phase.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::hook::Hook;
use crate::phase::HookPhase;

/// A hook together with the extension that contributed it.
#[derive(Clone)]
pub struct HookRegistration {
    extension: String,
    hook: Arc<dyn Hook>,
}

impl HookRegistration {
    /// The contributing extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The hook.
    pub fn hook(&self) -> &dyn Hook {
        self.hook.as_ref()
    }
}

impl fmt::Debug for HookRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistration")
            .field("extension", &self.extension)
            .field("hook", &self.hook.name())
            .finish()
    }
}

/// Every registered hook, grouped by phase in registration order.
///
/// The registry is populated up front (typically from extension manifests)
/// and then shared read-only with the executor.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    phases: IndexMap<HookPhase, Vec<HookRegistration>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to `phase`.
    pub fn register<H: Hook>(&mut self, phase: HookPhase, extension: impl Into<String>, hook: H) {
        self.register_arc(phase, extension, Arc::new(hook));
    }

    /// Appends an already shared hook to `phase`.
    pub fn register_arc(
        &mut self,
        phase: HookPhase,
        extension: impl Into<String>,
        hook: Arc<dyn Hook>,
    ) {
        let extension = extension.into();
        tracing::trace!(phase = %phase, extension = %extension, hook = hook.name(), "registering hook");
        self.phases
            .entry(phase)
            .or_default()
            .push(HookRegistration { extension, hook });
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<H: Hook>(mut self, phase: HookPhase, extension: impl Into<String>, hook: H) -> Self {
        self.register(phase, extension, hook);
        self
    }

    /// The hooks for `phase`, in execution order.
    pub fn hooks(&self, phase: &HookPhase) -> &[HookRegistration] {
        self.phases.get(phase).map_or(&[], Vec::as_slice)
    }

    /// Phases that have at least one hook, in first-registration order.
    pub fn phases(&self) -> impl Iterator<Item = &HookPhase> {
        self.phases.keys()
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.phases.values().map(Vec::len).sum()
    }

    /// Returns whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::hook_fn;
    use crate::record::ExecutionRecord;

    fn noop(name: &str) -> impl Hook {
        hook_fn(name.to_string(), |_record: &mut ExecutionRecord| {
            Box::pin(async { crate::hook::HookResult::Ok(()) })
        })
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = HookRegistry::new()
            .with(HookPhase::Config, "ext-a", noop("first"))
            .with(HookPhase::Init, "ext-b", noop("init"))
            .with(HookPhase::Config, "ext-b", noop("second"));

        let names: Vec<_> = registry
            .hooks(&HookPhase::Config)
            .iter()
            .map(|r| (r.extension(), r.hook().name()))
            .collect();
        assert_eq!(names, vec![("ext-a", "first"), ("ext-b", "second")]);
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.phases().collect::<Vec<_>>(),
            vec![&HookPhase::Config, &HookPhase::Init]
        );
    }

    #[test]
    fn test_unknown_phase_is_empty() {
        let registry = HookRegistry::new();
        assert!(registry.hooks(&HookPhase::Deploy).is_empty());
        assert!(registry.is_empty());
    }
}
