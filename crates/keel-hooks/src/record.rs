//! The per-phase argument bag handed to every hook.

use std::sync::Arc;

use keel_core::{
    ApplicationConfig, CliOptions, ConfigRecord, PackageDescriptor, ProgramInfo, TargetId,
};
use keel_expr::ExpressionResolver;

/// Everything a hook may inspect or modify during one phase run.
///
/// The record owns the target's configuration and the resolver for the
/// duration of the phase; callers move them in, run the phase and take them
/// back out with [`ExecutionRecord::into_parts`].
#[derive(Debug)]
pub struct ExecutionRecord {
    /// The package being built.
    pub package: Arc<PackageDescriptor>,
    /// Every target's configuration. The current target's entry is held in
    /// [`config`](Self::config) while the phase runs.
    pub container: ApplicationConfig,
    /// Program metadata.
    pub program: Arc<ProgramInfo>,
    /// The target being processed.
    pub target: TargetId,
    /// The target's configuration record.
    pub config: ConfigRecord,
    /// The resolver that will evaluate `config` after the phase.
    pub resolver: ExpressionResolver,
    /// Passthrough command-line options.
    pub options: CliOptions,
}

/// The owned state returned from an [`ExecutionRecord`].
#[derive(Debug)]
pub struct ExecutionParts {
    /// The multi-target container.
    pub container: ApplicationConfig,
    /// The (possibly mutated) target configuration.
    pub config: ConfigRecord,
    /// The resolver, including any transforms hooks registered.
    pub resolver: ExpressionResolver,
}

impl ExecutionRecord {
    /// Creates a record with an empty configuration and a default resolver.
    pub fn new(
        package: Arc<PackageDescriptor>,
        program: Arc<ProgramInfo>,
        target: TargetId,
    ) -> Self {
        Self {
            package,
            container: ApplicationConfig::new(),
            program,
            target,
            config: ConfigRecord::new(),
            resolver: ExpressionResolver::new(),
            options: CliOptions::new(),
        }
    }

    /// Sets the multi-target container.
    pub fn with_container(mut self, container: ApplicationConfig) -> Self {
        self.container = container;
        self
    }

    /// Sets the target configuration.
    pub fn with_config(mut self, config: ConfigRecord) -> Self {
        self.config = config;
        self
    }

    /// Sets the resolver.
    pub fn with_resolver(mut self, resolver: ExpressionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the passthrough options.
    pub fn with_options(mut self, options: CliOptions) -> Self {
        self.options = options;
        self
    }

    /// Consumes the record, returning the state the caller lent it.
    pub fn into_parts(self) -> ExecutionParts {
        ExecutionParts {
            container: self.container,
            config: self.config,
            resolver: self.resolver,
        }
    }
}
