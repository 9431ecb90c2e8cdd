//! # Keel Expr
//!
//! Expression resolver for Keel configuration records.
//!
//! Any string value in a [`ConfigRecord`](keel_core::ConfigRecord) may embed
//! expressions with the `${ ... }` syntax. Expressions see the whole record
//! as their variable namespace, so a field can be derived from its siblings:
//!
//! ```text
//! host:   "localhost"
//! port:   8080
//! url:    "http://${host}:${port}"      -> "http://localhost:8080"
//! debug:  "${ cliContext.mode[0] == 'dev' }"  -> true
//! ```
//!
//! ## Semantics
//!
//! - A string that is exactly one `${ expr }` yields the typed value of the
//!   expression; anything else is rendered and interpolated as text.
//! - Fields are resolved lazily in dependency order. A field that
//!   (transitively) depends on itself fails with
//!   [`ExpressionError::CircularReference`].
//! - Fields injected as transient (ignored) can be read but are never
//!   rewritten.
//! - References to missing fields evaluate to `null`.
//! - A resolved value is final. Text it contains is never evaluated again,
//!   so resolving a record twice gives the same result as resolving it once.
//! - An expression nests at most [`MAX_NESTING`] levels deep.
//! - Transforms extend the language with the pipe syntax:
//!   `name | upper`, `port | default(80)`.
//!
//! ## Example
//!
//! ```
//! use keel_core::ConfigRecord;
//! use keel_expr::{eval, ExpressionResolver, EVAL_TRANSFORM};
//! use serde_json::json;
//!
//! let mut resolver = ExpressionResolver::new();
//! resolver.register_transform(EVAL_TRANSFORM, eval);
//!
//! let mut record = ConfigRecord::new();
//! record.insert("a", json!(2));
//! record.insert("formula", json!("a * 10"));
//! record.insert("result", json!("${ formula | eval }"));
//!
//! resolver.resolve_all(&mut record).unwrap();
//! assert_eq!(record.get("result"), Some(&json!(20)));
//! ```

#![doc(html_root_url = "https://docs.rs/keel-expr/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod eval;
mod lexer;
mod parser;
pub mod path;
mod resolver;
pub mod template;
pub mod transform;

pub use error::{ExprResult, ExpressionError};
pub use parser::MAX_NESTING;
pub use path::{PathSegment, ValuePath};
pub use resolver::{ExpressionResolver, DEFAULT_MAX_DEPTH};
pub use template::has_expression;
pub use transform::{eval, TransformFn, TransformRegistry, TransformScope, EVAL_TRANSFORM};
