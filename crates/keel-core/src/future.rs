//! Type-erased async plumbing shared by hooks and middleware.

use std::future::Future;
use std::pin::Pin;

/// A boxed, `Send` future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed error raised by user-supplied hooks, transforms or middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
