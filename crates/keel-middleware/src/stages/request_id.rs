//! Request ID assignment.
//!
//! Every request gets a UUID v7 identifier so its log lines can be
//! correlated. When the caller already carries an identifier (attached as an
//! [`IncomingRequestId`] extension) it is reused if trusted and valid.

use keel_core::BoxFuture;

use crate::context::{RequestContext, RequestId};
use crate::error::MiddlewareResult;
use crate::middleware::{Middleware, Next};

/// An identifier supplied by the caller, e.g. from an upstream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequestId(pub String);

/// Assigns the request ID before the rest of the chain runs.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Always generates a fresh ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses a valid [`IncomingRequestId`] when one is present.
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn incoming(&self, ctx: &RequestContext) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        ctx.get_extension::<IncomingRequestId>()
            .and_then(|incoming| RequestId::parse(&incoming.0))
    }
}

impl Middleware<RequestContext> for RequestIdMiddleware {
    fn name(&self) -> &str {
        "request_id"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let request_id = self.incoming(ctx).unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);
            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MiddlewareChain;
    use crate::middleware::middleware_fn;

    /// Captures the request id seen downstream.
    fn capture() -> impl Middleware<RequestContext> {
        middleware_fn("capture", |ctx: &mut RequestContext, _next| {
            Box::pin(async move {
                let seen = ctx.request_id();
                ctx.set_extension(seen);
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_generates_fresh_id() {
        let chain = MiddlewareChain::new().with(RequestIdMiddleware::new());
        let mut ctx = RequestContext::new();
        let original = ctx.request_id();
        chain.run_with(&mut ctx, &capture()).await.unwrap();
        assert_ne!(ctx.request_id(), original);
        assert_eq!(ctx.get_extension::<RequestId>(), Some(&ctx.request_id()));
    }

    #[tokio::test]
    async fn test_trusted_incoming_id_reused() {
        let incoming = RequestId::new();
        let chain = MiddlewareChain::new().with(RequestIdMiddleware::trust_incoming());
        let mut ctx = RequestContext::new();
        ctx.set_extension(IncomingRequestId(incoming.to_string()));
        chain.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.request_id(), incoming);
    }

    #[tokio::test]
    async fn test_untrusted_or_invalid_incoming_ignored() {
        let incoming = RequestId::new();
        let mut ctx = RequestContext::new();
        ctx.set_extension(IncomingRequestId(incoming.to_string()));
        MiddlewareChain::new()
            .with(RequestIdMiddleware::new())
            .run(&mut ctx)
            .await
            .unwrap();
        assert_ne!(ctx.request_id(), incoming);

        let mut ctx = RequestContext::new();
        ctx.set_extension(IncomingRequestId("garbage".into()));
        let before = ctx.request_id();
        MiddlewareChain::new()
            .with(RequestIdMiddleware::trust_incoming())
            .run(&mut ctx)
            .await
            .unwrap();
        assert_ne!(ctx.request_id(), before);
    }
}
