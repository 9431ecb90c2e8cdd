//! Ready-made middleware units for [`RequestContext`](crate::RequestContext).

pub mod request_id;
pub mod tracing;

pub use request_id::{IncomingRequestId, RequestIdMiddleware};
pub use self::tracing::TracingMiddleware;
