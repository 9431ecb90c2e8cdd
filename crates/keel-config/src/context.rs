//! The context a CLI command runs with.

use std::path::PathBuf;
use std::sync::Arc;

use keel_core::{ApplicationConfig, CliOptions, PackageDescriptor, ProgramInfo, TargetId};
use keel_expr::ExpressionResolver;
use keel_hooks::{ExecutionParts, ExecutionRecord, HookExecutionError, HookExecutor};

use crate::pipeline::ConfigurationPipeline;
use crate::PipelineResult;

/// Output directory, relative to the package root, used by build commands.
pub const DEFAULT_DEST: &str = "dist";

/// Program metadata, package, resolved configuration and options for one
/// CLI invocation.
///
/// # Example
///
/// ```
/// use keel_config::{CliContext, ConfigurationPipeline};
/// use keel_core::{CliOptions, PackageDescriptor, TargetId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CliContext::create(
///     &ConfigurationPipeline::default(),
///     PackageDescriptor::new("shop", "2.1.0", "/work/shop"),
///     CliOptions::new().with_mode(["dev"]),
///     false,
/// )
/// .await
/// .unwrap();
///
/// assert!(ctx.config.get(&TargetId::frontend()).is_some());
/// assert_eq!(ctx.package.modes, vec!["dev".to_string()]);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Program metadata.
    pub program: Arc<ProgramInfo>,
    /// The package the command operates on.
    pub package: Arc<PackageDescriptor>,
    /// Resolved configuration of every target.
    pub config: ApplicationConfig,
    /// Passthrough command-line options.
    pub options: CliOptions,
    /// Output directory, relative to the package root.
    pub dest: PathBuf,
}

impl CliContext {
    /// Builds the context, resolving the pipeline's default targets unless
    /// `skip_resolution` is set.
    ///
    /// Modes given in the options replace the package's modes.
    pub async fn create(
        pipeline: &ConfigurationPipeline,
        package: PackageDescriptor,
        options: CliOptions,
        skip_resolution: bool,
    ) -> PipelineResult<Self> {
        let package = if options.mode.is_empty() {
            Arc::new(package)
        } else {
            Arc::new(package.with_modes(options.mode.iter().cloned()))
        };
        let mut config = ApplicationConfig::new();

        if skip_resolution {
            tracing::debug!("skipping configuration resolution");
        } else {
            for target in &pipeline.settings().default_targets {
                pipeline
                    .resolve_target(&mut config, target, &package, &options)
                    .await?;
            }
        }

        Ok(Self {
            program: Arc::clone(pipeline.program()),
            package,
            config,
            options,
            dest: PathBuf::from(DEFAULT_DEST),
        })
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.package.root_path().join(&self.dest)
    }

    /// The record handed to init hooks.
    ///
    /// Init hooks run once per invocation, against the backend target.
    pub fn init_context(&self) -> ExecutionRecord {
        self.config_context(&TargetId::backend())
    }

    /// A record for `target` holding a copy of its resolved configuration.
    pub fn config_context(&self, target: &TargetId) -> ExecutionRecord {
        ExecutionRecord::new(
            Arc::clone(&self.package),
            Arc::clone(&self.program),
            target.clone(),
        )
        .with_container(self.config.clone())
        .with_config(self.config.get(target).cloned().unwrap_or_default())
        .with_resolver(ExpressionResolver::new())
        .with_options(self.options.clone())
    }

    /// Runs the init hooks and keeps whatever configuration they changed.
    pub async fn execute_init_hooks(
        &mut self,
        executor: &HookExecutor,
    ) -> Result<(), HookExecutionError> {
        let mut record = self.init_context();
        let result = executor.execute_init_hooks(&mut record).await;

        let target = record.target.clone();
        let ExecutionParts {
            mut container,
            config,
            ..
        } = record.into_parts();
        container.insert(target, config);
        self.config = container;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_hooks::{hook_fn, HookPhase, HookRegistry, HookResult};
    use serde_json::json;

    fn package() -> PackageDescriptor {
        PackageDescriptor::new("shop", "2.1.0", "/work/shop")
    }

    #[test]
    fn test_skip_resolution() {
        let ctx = tokio_test::block_on(CliContext::create(
            &ConfigurationPipeline::default(),
            package(),
            CliOptions::new(),
            true,
        ))
        .unwrap();

        assert!(ctx.config.is_empty());
        assert_eq!(ctx.dest, PathBuf::from("dist"));
        assert_eq!(ctx.output_dir(), PathBuf::from("/work/shop/dist"));
    }

    #[test]
    fn test_config_context_copies_target() {
        let mut ctx = tokio_test::block_on(CliContext::create(
            &ConfigurationPipeline::default(),
            package(),
            CliOptions::new(),
            true,
        ))
        .unwrap();
        ctx.config
            .get_config(&TargetId::frontend())
            .insert("port", json!(8080));

        let record = ctx.config_context(&TargetId::frontend());
        assert_eq!(record.target, TargetId::frontend());
        assert_eq!(record.config.get("port"), Some(&json!(8080)));
        assert_eq!(record.container.len(), 1);

        let empty = ctx.config_context(&TargetId::from("edge"));
        assert!(empty.config.is_empty());
    }

    #[tokio::test]
    async fn test_init_hooks_update_context() {
        let mut registry = HookRegistry::new();
        registry.register(
            HookPhase::Init,
            "scaffold",
            hook_fn("mark", |record: &mut ExecutionRecord| {
                Box::pin(async move {
                    record.config.insert("scaffolded", json!(true));
                    HookResult::Ok(())
                })
            }),
        );
        let executor = HookExecutor::new(Arc::new(registry));

        let mut ctx = CliContext::create(
            &ConfigurationPipeline::default(),
            package(),
            CliOptions::new(),
            true,
        )
        .await
        .unwrap();
        ctx.execute_init_hooks(&executor).await.unwrap();

        let backend = ctx.config.get(&TargetId::backend()).unwrap();
        assert_eq!(backend.get("scaffolded"), Some(&json!(true)));
    }
}
