//! # Keel Core
//!
//! Core data model shared by every Keel crate.
//!
//! This crate provides the foundational types used by the configuration
//! pipeline and the middleware dispatcher:
//!
//! - [`ConfigValue`] / [`ConfigMap`] - Tagged-variant configuration values
//! - [`ConfigRecord`] - Per-target configuration with transient-field tracking
//! - [`TargetId`] - Deployment target identifier (`frontend`, `backend`, ...)
//! - [`PackageDescriptor`] - Externally parsed package metadata
//! - [`ProgramInfo`] / [`CliOptions`] - Externally parsed program metadata and options
//! - [`ApplicationConfig`] - The multi-target configuration container
//! - [`BoxFuture`] / [`BoxError`] - Type-erased async plumbing

#![doc(html_root_url = "https://docs.rs/keel-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod container;
mod future;
mod package;
mod program;
mod record;
mod target;
pub mod value;

pub use container::ApplicationConfig;
pub use future::{BoxError, BoxFuture};
pub use package::PackageDescriptor;
pub use program::{CliOptions, ProgramInfo};
pub use record::{
    ConfigRecord, CLI_CONTEXT_FIELD, CURRENT_RUNTIME_PATH_FIELD, ENV_FIELD, PKG_FIELD,
    TRANSIENT_FIELDS,
};
pub use target::{TargetId, BACKEND_TARGET, FRONTEND_TARGET};
pub use value::{ConfigMap, ConfigValue};
