//! # Keel Middleware
//!
//! Onion-style middleware dispatch.
//!
//! A [`MiddlewareChain`] is an ordered list of units. Running it enters the
//! first unit, which may call its [`Next`] continuation to enter the second,
//! and so on down to an optional terminal handler. Each unit's code after
//! `next.run(ctx).await` runs once everything downstream has settled:
//!
//! ```text
//! run ──▶ A(pre) ──▶ B(pre) ──▶ terminal
//!                                  │
//! done ◀── A(post) ◀── B(post) ◀───┘
//! ```
//!
//! ## Dispatch rules
//!
//! | Situation                              | Outcome                          |
//! |----------------------------------------|----------------------------------|
//! | unit calls `next` a second time        | `NextCalledMultipleTimes`        |
//! | last unit calls `next`, no terminal    | `Ok(())`                         |
//! | terminal calls `next`                  | `PositionOutOfRange`             |
//! | unit returns an error                  | propagates to every outer unit   |
//! | unit never calls `next`                | downstream units do not run      |
//!
//! ## Stages
//!
//! [`stages`] provides [`RequestIdMiddleware`](stages::RequestIdMiddleware)
//! and [`TracingMiddleware`](stages::TracingMiddleware) for
//! [`RequestContext`].

#![doc(html_root_url = "https://docs.rs/keel-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod error;
pub mod middleware;
pub mod stages;

pub use chain::{compose, MiddlewareChain};
pub use context::{RequestContext, RequestId};
pub use error::{MiddlewareError, MiddlewareProtocolError, MiddlewareResult};
pub use middleware::{middleware_fn, FnMiddleware, Middleware, Next};
