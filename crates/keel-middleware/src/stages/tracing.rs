//! Request span and outcome logging.

use std::time::Instant;

use keel_core::BoxFuture;
use tracing::Instrument;

use crate::context::RequestContext;
use crate::error::MiddlewareResult;
use crate::middleware::{Middleware, Next};

/// Wraps the downstream chain in a `request` span and logs its outcome.
///
/// Place it after [`RequestIdMiddleware`](super::RequestIdMiddleware) so the
/// span carries the final request ID.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    service_name: String,
}

impl TracingMiddleware {
    /// Creates the unit; `service_name` is recorded on every span.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// The service name recorded on spans.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new("keel")
    }
}

impl Middleware<RequestContext> for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            let span = tracing::info_span!(
                "request",
                service = %self.service_name,
                request_id = %request_id,
            );
            let start = Instant::now();
            let result = next.run(ctx).instrument(span.clone()).await;
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

            span.in_scope(|| match &result {
                Ok(()) => tracing::debug!(duration_ms, "request completed"),
                Err(error) => tracing::warn!(duration_ms, error = %error, "request failed"),
            });
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MiddlewareChain;
    use crate::error::MiddlewareError;
    use crate::middleware::middleware_fn;

    #[tokio::test]
    async fn test_passes_result_through() {
        let chain = MiddlewareChain::new().with(TracingMiddleware::new("svc"));
        let failing = middleware_fn("fail", |_ctx: &mut RequestContext, _next| {
            Box::pin(async { Err(MiddlewareError::unhandled("downstream broke")) })
        });

        let mut ctx = RequestContext::new();
        let err = chain.run_with(&mut ctx, &failing).await.unwrap_err();
        assert_eq!(err.to_string(), "downstream broke");

        assert!(chain.run(&mut ctx).await.is_ok());
    }

    #[test]
    fn test_default_service_name() {
        assert_eq!(TracingMiddleware::default().service_name(), "keel");
    }
}
