//! # Keel
//!
//! **Configuration resolution and middleware dispatch for build tooling**
//!
//! Keel resolves one configuration record per deployment target and runs
//! request processing through onion-style middleware chains:
//!
//! - **Config hooks**: extensions mutate each target's record, strictly in
//!   registration order
//! - **Expressions**: `${...}` templates evaluated against the record, with
//!   cycle detection and pluggable transforms
//! - **Middleware**: `next`-style units with a per-invocation cursor
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use keel::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = HookRegistry::new();
//! registry.register(
//!     HookPhase::Config,
//!     "server",
//!     hook_fn("port", |record: &mut ExecutionRecord| {
//!         Box::pin(async move {
//!             record.config.insert("port", json!(3000));
//!             record.config.insert("url", json!("http://localhost:${port}"));
//!             HookResult::Ok(())
//!         })
//!     }),
//! );
//!
//! let resolved = ConfigurationPipeline::new(Arc::new(registry))
//!     .resolve(
//!         &[TargetId::backend()],
//!         &PackageDescriptor::new("shop", "1.0.0", "."),
//!         &CliOptions::new(),
//!     )
//!     .await?;
//! let backend = Arc::new(resolved[&TargetId::backend()].clone());
//!
//! let chain = MiddlewareChain::new()
//!     .with(RequestIdMiddleware::new())
//!     .with(TracingMiddleware::new("shop"));
//! let mut ctx = RequestContext::new().with_config(backend);
//! chain.run(&mut ctx).await?;
//!
//! assert_eq!(ctx.config_value("url"), Some(&json!("http://localhost:3000")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PackageDescriptor ─┐
//! CliOptions ────────┼─▶ ConfigurationPipeline ─(per target)─▶ HookExecutor
//! HookRegistry ──────┘                                            │
//!                                                                 ▼
//!        RequestContext ◀── Arc<ConfigRecord> ◀── ExpressionResolver
//!              │
//!              ▼
//!        MiddlewareChain: A-in ▶ B-in ▶ terminal ▶ B-out ▶ A-out
//! ```

#![doc(html_root_url = "https://docs.rs/keel/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use keel_core as core;

// Re-export expression types
pub use keel_expr as expr;

// Re-export hook types
pub use keel_hooks as hooks;

// Re-export pipeline and settings types
pub use keel_config as config;

// Re-export middleware types
pub use keel_middleware as middleware;

// Re-export logging setup
pub use keel_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use keel::prelude::*;
/// ```
pub mod prelude {
    pub use keel_core::{
        ApplicationConfig, BoxError, BoxFuture, CliOptions, ConfigMap, ConfigRecord, ConfigValue,
        PackageDescriptor, ProgramInfo, TargetId,
    };

    pub use keel_expr::{ExpressionError, ExpressionResolver, TransformScope};

    pub use keel_hooks::{
        hook_fn, ExecutionRecord, Hook, HookExecutionError, HookExecutor, HookPhase,
        HookRegistry, HookResult,
    };

    pub use keel_config::{
        CliContext, ConfigurationPipeline, KeelSettings, PipelineError, PipelineSettings,
        SettingsError, SettingsLoader,
    };

    pub use keel_middleware::stages::{RequestIdMiddleware, TracingMiddleware};
    pub use keel_middleware::{
        middleware_fn, Middleware, MiddlewareChain, MiddlewareError, MiddlewareResult, Next,
        RequestContext, RequestId,
    };

    pub use keel_telemetry::{init_logging, LogConfig, LogFormat};
}
