//! The hook trait and closure adapter.
//!
//! # Example
//!
//! ```
//! use keel_core::{BoxFuture, BoxError};
//! use keel_hooks::{Hook, ExecutionRecord};
//! use serde_json::json;
//!
//! struct DefaultPort;
//!
//! impl Hook for DefaultPort {
//!     fn name(&self) -> &str {
//!         "default-port"
//!     }
//!
//!     fn call<'a>(&'a self, record: &'a mut ExecutionRecord) -> BoxFuture<'a, Result<(), BoxError>> {
//!         Box::pin(async move {
//!             if !record.config.contains_key("port") {
//!                 record.config.insert("port", json!(3000));
//!             }
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use keel_core::{BoxError, BoxFuture};

use crate::record::ExecutionRecord;

/// Outcome of a single hook invocation.
pub type HookResult = Result<(), BoxError>;

/// An extension-supplied handler for one lifecycle phase.
///
/// Hooks receive exclusive access to the phase's [`ExecutionRecord`] and may
/// mutate the target configuration, register expression transforms, or do
/// any asynchronous work. The executor awaits each hook before starting the
/// next.
pub trait Hook: Send + Sync + 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Runs the hook.
    fn call<'a>(&'a self, record: &'a mut ExecutionRecord) -> BoxFuture<'a, HookResult>;
}

/// A hook backed by a closure.
///
/// ```
/// use keel_hooks::{hook_fn, ExecutionRecord, HookResult};
/// use serde_json::json;
///
/// let hook = hook_fn("mark", |record: &mut ExecutionRecord| {
///     Box::pin(async move {
///         record.config.insert("marked", json!(true));
///         HookResult::Ok(())
///     })
/// });
/// ```
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F> FnHook<F>
where
    F: for<'a> Fn(&'a mut ExecutionRecord) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    /// Creates a closure-backed hook.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Hook for FnHook<F>
where
    F: for<'a> Fn(&'a mut ExecutionRecord) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call<'a>(&'a self, record: &'a mut ExecutionRecord) -> BoxFuture<'a, HookResult> {
        (self.func)(record)
    }
}

impl<F> std::fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook").field("name", &self.name).finish()
    }
}

/// Shorthand for [`FnHook::new`].
pub fn hook_fn<F>(name: impl Into<String>, func: F) -> FnHook<F>
where
    F: for<'a> Fn(&'a mut ExecutionRecord) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    FnHook::new(name, func)
}
