//! # Keel Config
//!
//! Per-target configuration resolution and the tool's own settings.
//!
//! - [`ConfigurationPipeline`] resolves each target's [`ConfigRecord`]: it
//!   injects the transient fields, runs the config hooks, evaluates every
//!   `${...}` expression and strips the transient fields again.
//! - [`CliContext`] bundles a resolved container with the package, program
//!   metadata and options for one CLI invocation.
//! - [`SettingsLoader`] loads [`KeelSettings`] from defaults, a TOML/JSON
//!   file and `KEEL__SECTION__KEY` environment variables.
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │ inject env, │──▶│ configHooks  │──▶│ resolve_all  │──▶│ strip and  │
//! │ pkg, ...    │   │ (sequential) │   │ (${...})     │   │ write back │
//! └─────────────┘   └──────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! [`ConfigRecord`]: keel_core::ConfigRecord

#![doc(html_root_url = "https://docs.rs/keel-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod loader;
mod pipeline;
mod settings;

pub use context::{CliContext, DEFAULT_DEST};
pub use error::{PipelineError, SettingsError};
pub use loader::{SettingsLoader, DEFAULT_ENV_PREFIX};
pub use pipeline::ConfigurationPipeline;
pub use settings::{KeelSettings, LoggingSettings, PipelineSettings};

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
