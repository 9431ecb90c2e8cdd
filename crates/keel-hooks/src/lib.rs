//! # Keel Hooks
//!
//! Phase-keyed extension hooks.
//!
//! Extensions contribute [`Hook`]s for named lifecycle phases
//! ([`HookPhase`]). The [`HookExecutor`] runs the hooks of a phase strictly
//! one after another, in registration order, against a shared
//! [`ExecutionRecord`]:
//!
//! ```text
//! registry[configHooks] = [ext-a/ports, ext-b/proxy, ext-c/env]
//!
//!   ports ──await──▶ proxy ──await──▶ env ──▶ done
//!     │                │                │
//!     └──────── &mut ExecutionRecord ───┘
//! ```
//!
//! A hook that fails stops the phase; the error names the phase, the
//! extension and the hook.

#![doc(html_root_url = "https://docs.rs/keel-hooks/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod executor;
mod hook;
mod phase;
mod record;
mod registry;

pub use error::HookExecutionError;
pub use executor::HookExecutor;
pub use hook::{hook_fn, FnHook, Hook, HookResult};
pub use phase::HookPhase;
pub use record::{ExecutionParts, ExecutionRecord};
pub use registry::{HookRegistration, HookRegistry};
