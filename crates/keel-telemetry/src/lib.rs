//! Logging setup for Keel.
//!
//! Every Keel crate emits structured events through `tracing`; this crate
//! installs the subscriber that renders them. Binaries call
//! [`init_logging`] once at startup. Libraries never do.
//!
//! Field names used across the workspace live in [`fields`].

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat, LOG_ENV_VAR};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
