//! Dispatch order and continuation-protocol tests.

use std::sync::Arc;

use keel_core::BoxFuture;
use keel_middleware::{
    compose, Middleware, MiddlewareChain, MiddlewareError, MiddlewareProtocolError,
    MiddlewareResult, Next,
};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<String>>>;

/// Test context: just an event log.
#[derive(Default)]
struct Ctx {
    log: Vec<String>,
}

/// Logs `<name>-in`, calls `next` `calls` times, then logs `<name>-out`.
struct Unit {
    name: &'static str,
    calls: usize,
    entered: Log,
}

impl Unit {
    fn new(name: &'static str, entered: &Log) -> Self {
        Self {
            name,
            calls: 1,
            entered: Arc::clone(entered),
        }
    }
}

impl Middleware<Ctx> for Unit {
    fn name(&self) -> &str {
        self.name
    }

    fn handle<'a>(&'a self, ctx: &'a mut Ctx, next: Next<'a, Ctx>) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            self.entered.lock().push(self.name.to_string());
            ctx.log.push(format!("{}-in", self.name));
            for _ in 0..self.calls {
                next.run(ctx).await?;
            }
            ctx.log.push(format!("{}-out", self.name));
            Ok(())
        })
    }
}

/// Terminal handler; optionally (mis)calls its own continuation.
struct Terminal {
    call_next: bool,
}

impl Middleware<Ctx> for Terminal {
    fn name(&self) -> &str {
        "terminal"
    }

    fn handle<'a>(&'a self, ctx: &'a mut Ctx, next: Next<'a, Ctx>) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            ctx.log.push("T".to_string());
            if self.call_next {
                next.run(ctx).await?;
            }
            Ok(())
        })
    }
}

/// Fails without calling `next`.
struct Failing;

impl Middleware<Ctx> for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn handle<'a>(&'a self, ctx: &'a mut Ctx, _next: Next<'a, Ctx>) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            ctx.log.push("failing".to_string());
            Err(MiddlewareError::unhandled("boom"))
        })
    }
}

fn terminal() -> Terminal {
    Terminal { call_next: false }
}

#[tokio::test]
async fn onion_order() {
    let entered = Log::default();
    let chain = MiddlewareChain::new()
        .with(Unit::new("A", &entered))
        .with(Unit::new("B", &entered));

    let mut ctx = Ctx::default();
    chain.run_with(&mut ctx, &terminal()).await.unwrap();
    assert_eq!(ctx.log, ["A-in", "B-in", "T", "B-out", "A-out"]);
}

#[tokio::test]
async fn next_twice_fails_without_reentering() {
    let entered = Log::default();
    let chain = MiddlewareChain::new()
        .with(Unit {
            calls: 2,
            ..Unit::new("A", &entered)
        })
        .with(Unit::new("B", &entered));

    let mut ctx = Ctx::default();
    let err = chain.run_with(&mut ctx, &terminal()).await.unwrap_err();

    assert!(matches!(
        err.protocol(),
        Some(MiddlewareProtocolError::NextCalledMultipleTimes { position: 1 })
    ));
    assert!(err.to_string().contains("next invoked more than once"));
    assert_eq!(*entered.lock(), ["A", "B"]);
    // A's post-continuation code never ran.
    assert_eq!(ctx.log, ["A-in", "B-in", "T", "B-out"]);
}

#[tokio::test]
async fn empty_chain_runs_only_terminal() {
    let chain = MiddlewareChain::<Ctx>::new();
    let mut ctx = Ctx::default();
    chain.run_with(&mut ctx, &terminal()).await.unwrap();
    assert_eq!(ctx.log, ["T"]);
}

#[tokio::test]
async fn end_of_chain_without_terminal_succeeds() {
    let entered = Log::default();
    let chain = MiddlewareChain::new().with(Unit::new("A", &entered));
    let mut ctx = Ctx::default();
    chain.run(&mut ctx).await.unwrap();
    assert_eq!(ctx.log, ["A-in", "A-out"]);
}

#[tokio::test]
async fn terminal_calling_next_is_out_of_range() {
    let entered = Log::default();
    let chain = MiddlewareChain::new().with(Unit::new("A", &entered));
    let mut ctx = Ctx::default();
    let err = chain
        .run_with(&mut ctx, &Terminal { call_next: true })
        .await
        .unwrap_err();
    assert!(matches!(
        err.protocol(),
        Some(MiddlewareProtocolError::PositionOutOfRange { position: 2, len: 1 })
    ));
}

#[tokio::test]
async fn failure_propagates_outward() {
    let entered = Log::default();
    let chain = MiddlewareChain::new()
        .with(Unit::new("A", &entered))
        .with(Failing)
        .with(Unit::new("C", &entered));

    let mut ctx = Ctx::default();
    let err = chain.run_with(&mut ctx, &terminal()).await.unwrap_err();
    assert!(matches!(err, MiddlewareError::Unhandled(_)));
    assert_eq!(err.to_string(), "boom");
    assert_eq!(ctx.log, ["A-in", "failing"]);
    assert_eq!(*entered.lock(), ["A"]);
}

#[tokio::test]
async fn chain_is_reusable_and_shareable() {
    let entered = Log::default();
    let units: Vec<Arc<dyn Middleware<Ctx>>> = vec![
        Arc::new(Unit::new("A", &entered)),
        Arc::new(Unit::new("B", &entered)),
    ];
    let chain = Arc::new(compose(units));
    assert_eq!(chain.names().collect::<Vec<_>>(), ["A", "B"]);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let chain = Arc::clone(&chain);
        handles.push(tokio::spawn(async move {
            let mut ctx = Ctx::default();
            chain.run(&mut ctx).await.map(|()| ctx.log)
        }));
    }
    for handle in handles {
        let log = handle.await.unwrap().unwrap();
        assert_eq!(log, ["A-in", "B-in", "B-out", "A-out"]);
    }
    assert_eq!(entered.lock().len(), 8);
}
