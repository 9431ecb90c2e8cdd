//! The per-target configuration pipeline.
//!
//! For each target the pipeline:
//!
//! 1. takes the target's record out of the container (empty if absent),
//! 2. injects the transient fields `env`, `pkg`, `currentRuntimePath` and
//!    `cliContext`, marked so the resolver never rewrites them,
//! 3. runs the [`HookPhase::Config`] hooks,
//! 4. resolves every `${...}` expression,
//! 5. strips the transient fields,
//! 6. writes the record back, so hooks of later targets see it resolved.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use keel_core::{
    ApplicationConfig, CliOptions, ConfigMap, ConfigRecord, ConfigValue, PackageDescriptor,
    ProgramInfo, TargetId, CLI_CONTEXT_FIELD, CURRENT_RUNTIME_PATH_FIELD, ENV_FIELD, PKG_FIELD,
};
use keel_expr::{ExpressionResolver, EVAL_TRANSFORM};
use keel_hooks::{ExecutionParts, ExecutionRecord, HookExecutor, HookPhase, HookRegistry};
use tracing::Instrument;

use crate::error::PipelineError;
use crate::settings::PipelineSettings;
use crate::PipelineResult;

/// Resolves per-target configuration by running hooks and expressions.
///
/// # Example
///
/// ```
/// use keel_config::ConfigurationPipeline;
/// use keel_core::{CliOptions, PackageDescriptor, TargetId};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let package = PackageDescriptor::new("shop", "2.1.0", "/work/shop");
/// let mut container = keel_core::ApplicationConfig::new();
/// container
///     .get_config(&TargetId::backend())
///     .insert("banner", json!("${pkg.name}@${pkg.version}"));
///
/// ConfigurationPipeline::default()
///     .resolve_into(&mut container, &[TargetId::backend()], &package, &CliOptions::new())
///     .await
///     .unwrap();
///
/// let backend = container.get(&TargetId::backend()).unwrap();
/// assert_eq!(backend.get("banner"), Some(&json!("shop@2.1.0")));
/// assert!(!backend.contains_key("pkg"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigurationPipeline {
    executor: HookExecutor,
    settings: PipelineSettings,
    program: Arc<ProgramInfo>,
}

impl ConfigurationPipeline {
    /// Creates a pipeline over the hooks in `registry`.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self {
            executor: HookExecutor::new(registry),
            ..Self::default()
        }
    }

    /// Sets the pipeline settings.
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the program metadata exposed as `cliContext` and to hooks.
    #[must_use]
    pub fn with_program(mut self, program: ProgramInfo) -> Self {
        self.program = Arc::new(program);
        self
    }

    /// The pipeline settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The program metadata.
    pub fn program(&self) -> &Arc<ProgramInfo> {
        &self.program
    }

    /// The hook executor.
    pub fn executor(&self) -> &HookExecutor {
        &self.executor
    }

    /// Resolves `targets` starting from empty records.
    ///
    /// An empty `targets` slice resolves the configured default targets.
    /// Stops at the first target that fails.
    pub async fn resolve(
        &self,
        targets: &[TargetId],
        package: &PackageDescriptor,
        options: &CliOptions,
    ) -> PipelineResult<IndexMap<TargetId, ConfigRecord>> {
        let mut container = ApplicationConfig::new();
        self.resolve_into(&mut container, targets, package, options)
            .await?;

        let targets = self.targets_or_default(targets);
        let mut resolved = container.into_inner();
        Ok(targets
            .iter()
            .filter_map(|target| {
                resolved
                    .shift_remove(target)
                    .map(|record| (target.clone(), record))
            })
            .collect())
    }

    /// Resolves `targets` in place, in order.
    ///
    /// An empty `targets` slice resolves the configured default targets.
    /// Stops at the first target that fails; targets already resolved keep
    /// their resolved records.
    pub async fn resolve_into(
        &self,
        container: &mut ApplicationConfig,
        targets: &[TargetId],
        package: &PackageDescriptor,
        options: &CliOptions,
    ) -> PipelineResult<()> {
        let package = Arc::new(package.clone());
        for target in self.targets_or_default(targets) {
            self.resolve_target(container, target, &package, options)
                .await?;
        }
        Ok(())
    }

    /// Resolves a single target in place.
    ///
    /// On failure the target's record stays in the container with its
    /// transient fields removed.
    pub async fn resolve_target(
        &self,
        container: &mut ApplicationConfig,
        target: &TargetId,
        package: &Arc<PackageDescriptor>,
        options: &CliOptions,
    ) -> PipelineResult<()> {
        let span = tracing::info_span!("resolve_target", target_id = %target);
        self.run_target(container, target, package, options)
            .instrument(span)
            .await
    }

    async fn run_target(
        &self,
        container: &mut ApplicationConfig,
        target: &TargetId,
        package: &Arc<PackageDescriptor>,
        options: &CliOptions,
    ) -> PipelineResult<()> {
        let mut config = container.take(target);
        self.inject_transient(&mut config, package, options);

        let mut record = ExecutionRecord::new(
            Arc::clone(package),
            Arc::clone(&self.program),
            target.clone(),
        )
        .with_container(std::mem::take(container))
        .with_config(config)
        .with_resolver(self.resolver())
        .with_options(options.clone());

        let hooks = self
            .executor
            .execute_hooks(&mut record, &HookPhase::Config)
            .await;

        let ExecutionParts {
            container: returned,
            mut config,
            resolver,
        } = record.into_parts();
        *container = returned;

        let outcome = match hooks {
            Ok(()) => resolver
                .resolve_all(&mut config)
                .map_err(|source| PipelineError::Expression {
                    target: target.clone(),
                    source,
                }),
            Err(source) => Err(PipelineError::Hook {
                target: target.clone(),
                source,
            }),
        };

        config.strip_transient();
        container.insert(target.clone(), config);

        match &outcome {
            Ok(()) => tracing::debug!("target resolved"),
            Err(e) => tracing::warn!(error = %e, "target resolution failed"),
        }
        outcome
    }

    fn targets_or_default<'t>(&'t self, targets: &'t [TargetId]) -> &'t [TargetId] {
        if targets.is_empty() {
            &self.settings.default_targets
        } else {
            targets
        }
    }

    fn resolver(&self) -> ExpressionResolver {
        let mut resolver =
            ExpressionResolver::new().with_max_depth(self.settings.max_expression_depth);
        resolver.register_transform(EVAL_TRANSFORM, keel_expr::eval);
        resolver
    }

    fn inject_transient(
        &self,
        config: &mut ConfigRecord,
        package: &PackageDescriptor,
        options: &CliOptions,
    ) {
        config.inject_transient(ENV_FIELD, self.env_snapshot());
        config.inject_transient(PKG_FIELD, package.to_value());
        config.inject_transient(
            CURRENT_RUNTIME_PATH_FIELD,
            ConfigValue::String(self.runtime_root(package).display().to_string()),
        );
        config.inject_transient(CLI_CONTEXT_FIELD, options.merged_with(&self.program));
    }

    fn env_snapshot(&self) -> ConfigValue {
        if !self.settings.snapshot_env {
            return ConfigValue::Object(ConfigMap::new());
        }
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .map(|(k, v)| (k, ConfigValue::String(v)))
            .collect::<ConfigMap>()
            .into()
    }

    fn runtime_root(&self, package: &PackageDescriptor) -> PathBuf {
        self.settings
            .runtime_root
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| package.root_path().to_path_buf())
    }
}
