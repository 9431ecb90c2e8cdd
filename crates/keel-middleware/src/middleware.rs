//! Core middleware trait and continuation.
//!
//! A middleware unit receives the mutable context and a [`Next`]
//! continuation. Code before `next.run(ctx)` runs on the way in, code after
//! it runs on the way out, once everything downstream has settled:
//!
//! ```text
//!   A ──▶ B ──▶ terminal
//!   A ◀── B ◀──┘
//! ```
//!
//! # Example
//!
//! ```
//! use keel_core::BoxFuture;
//! use keel_middleware::{Middleware, MiddlewareResult, Next, RequestContext};
//!
//! struct Timing;
//!
//! impl Middleware<RequestContext> for Timing {
//!     fn name(&self) -> &str {
//!         "timing"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         next: Next<'a, RequestContext>,
//!     ) -> BoxFuture<'a, MiddlewareResult> {
//!         Box::pin(async move {
//!             let result = next.run(ctx).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "downstream finished");
//!             result
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::future::ready;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use keel_core::BoxFuture;

use crate::error::{MiddlewareProtocolError, MiddlewareResult};

/// A unit of an onion-style middleware chain.
///
/// # Invariants
///
/// - A unit calls `next.run()` at most once. A second call fails with
///   [`MiddlewareProtocolError::NextCalledMultipleTimes`] and does not
///   re-enter downstream units.
/// - A unit that does not call `next.run()` short-circuits the chain.
/// - Errors from downstream should be returned, not swallowed.
pub trait Middleware<C>: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Processes `ctx`, optionally continuing with `next`.
    fn handle<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> BoxFuture<'a, MiddlewareResult>;
}

/// Per-invocation dispatch state.
///
/// Holds the cursor recording the highest position entered so far; it
/// starts at -1 and lives only as long as one `run` call.
pub(crate) struct Dispatcher<'d, C> {
    units: &'d [Arc<dyn Middleware<C>>],
    terminal: Option<&'d dyn Middleware<C>>,
    cursor: AtomicIsize,
}

impl<'d, C: Send + 'static> Dispatcher<'d, C> {
    pub(crate) fn new(
        units: &'d [Arc<dyn Middleware<C>>],
        terminal: Option<&'d dyn Middleware<C>>,
    ) -> Self {
        Self {
            units,
            terminal,
            cursor: AtomicIsize::new(-1),
        }
    }

    /// Enters the unit at `position`.
    ///
    /// Position `units.len()` is the terminal handler; with no terminal the
    /// chain ends successfully there.
    pub(crate) fn dispatch<'b>(&'b self, position: usize, ctx: &'b mut C) -> BoxFuture<'b, MiddlewareResult>
    where
        'd: 'b,
    {
        let len = self.units.len();
        let index = position as isize;

        if index <= self.cursor.load(Ordering::Acquire) {
            tracing::warn!(position, "next invoked more than once");
            return Box::pin(ready(Err(
                MiddlewareProtocolError::NextCalledMultipleTimes { position }.into(),
            )));
        }
        if position > len {
            return Box::pin(ready(Err(
                MiddlewareProtocolError::PositionOutOfRange { position, len }.into(),
            )));
        }
        self.cursor.store(index, Ordering::Release);

        let unit: &'b dyn Middleware<C> = if position == len {
            match self.terminal {
                Some(terminal) => terminal,
                None => return Box::pin(ready(Ok(()))),
            }
        } else {
            self.units[position].as_ref()
        };

        tracing::trace!(position, middleware = unit.name(), "entering middleware");
        let next = Next {
            dispatcher: self,
            position: position + 1,
        };
        unit.handle(ctx, next)
    }
}

/// Continuation handed to a middleware unit.
///
/// Calling [`run`](Next::run) enters the next unit (or the terminal
/// handler). The returned future settles once every downstream unit has
/// finished.
pub struct Next<'a, C> {
    dispatcher: &'a Dispatcher<'a, C>,
    position: usize,
}

impl<'a, C: Send + 'static> Next<'a, C> {
    /// Runs the rest of the chain.
    pub fn run<'b>(&self, ctx: &'b mut C) -> BoxFuture<'b, MiddlewareResult>
    where
        'a: 'b,
    {
        self.dispatcher.dispatch(self.position, ctx)
    }

    /// Position of the unit this continuation will enter.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<C> fmt::Debug for Next<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// A middleware unit backed by a closure.
///
/// ```
/// use keel_middleware::{middleware_fn, MiddlewareChain, RequestContext};
///
/// let chain = MiddlewareChain::new().with(middleware_fn(
///     "passthrough",
///     |ctx: &mut RequestContext, next| Box::pin(async move { next.run(ctx).await }),
/// ));
/// assert_eq!(chain.len(), 1);
/// ```
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a closure-backed unit.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<C, F> Middleware<C> for FnMiddleware<F>
where
    C: Send + 'static,
    F: for<'a> Fn(&'a mut C, Next<'a, C>) -> BoxFuture<'a, MiddlewareResult>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> BoxFuture<'a, MiddlewareResult> {
        (self.func)(ctx, next)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish()
    }
}

/// Shorthand for [`FnMiddleware::new`] that pins down the closure signature.
pub fn middleware_fn<C, F>(name: impl Into<String>, func: F) -> FnMiddleware<F>
where
    C: Send + 'static,
    F: for<'a> Fn(&'a mut C, Next<'a, C>) -> BoxFuture<'a, MiddlewareResult>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware::new(name, func)
}
