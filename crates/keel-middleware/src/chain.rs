//! Ordered middleware chains.

use std::fmt;
use std::sync::Arc;

use crate::error::MiddlewareResult;
use crate::middleware::{Dispatcher, Middleware};

/// An immutable, shareable sequence of middleware units.
///
/// The chain itself holds no per-invocation state: every
/// [`run`](Self::run) creates a fresh dispatcher, so one chain can serve any
/// number of concurrent invocations.
///
/// # Example
///
/// ```
/// use keel_middleware::{middleware_fn, MiddlewareChain, RequestContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let chain = MiddlewareChain::new()
///     .with(middleware_fn("a", |ctx: &mut RequestContext, next| {
///         Box::pin(async move { next.run(ctx).await })
///     }));
///
/// let mut ctx = RequestContext::new();
/// chain.run(&mut ctx).await.unwrap();
/// # }
/// ```
pub struct MiddlewareChain<C> {
    units: Vec<Arc<dyn Middleware<C>>>,
}

impl<C: Send + 'static> MiddlewareChain<C> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Appends a unit.
    pub fn push<M: Middleware<C>>(&mut self, unit: M) {
        self.units.push(Arc::new(unit));
    }

    /// Appends an already shared unit.
    pub fn push_arc(&mut self, unit: Arc<dyn Middleware<C>>) {
        self.units.push(unit);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with<M: Middleware<C>>(mut self, unit: M) -> Self {
        self.push(unit);
        self
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns whether the chain has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|unit| unit.name())
    }

    /// Runs the chain. Reaching the end of the chain succeeds.
    pub async fn run(&self, ctx: &mut C) -> MiddlewareResult {
        Dispatcher::new(&self.units, None).dispatch(0, ctx).await
    }

    /// Runs the chain with `terminal` as the innermost handler.
    ///
    /// The terminal handler runs after the last unit calls its continuation.
    /// If the terminal handler calls its own continuation, that call fails
    /// with a protocol error.
    pub async fn run_with(&self, ctx: &mut C, terminal: &dyn Middleware<C>) -> MiddlewareResult {
        Dispatcher::new(&self.units, Some(terminal))
            .dispatch(0, ctx)
            .await
    }
}

impl<C: Send + 'static> Default for MiddlewareChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for MiddlewareChain<C> {
    fn clone(&self) -> Self {
        Self {
            units: self.units.clone(),
        }
    }
}

impl<C: Send + 'static> fmt::Debug for MiddlewareChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.units.iter().map(|unit| unit.name()))
            .finish()
    }
}

impl<C: Send + 'static> FromIterator<Arc<dyn Middleware<C>>> for MiddlewareChain<C> {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Middleware<C>>>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

/// Builds a chain from shared units, preserving order.
pub fn compose<C, I>(units: I) -> MiddlewareChain<C>
where
    C: Send + 'static,
    I: IntoIterator<Item = Arc<dyn Middleware<C>>>,
{
    units.into_iter().collect()
}
