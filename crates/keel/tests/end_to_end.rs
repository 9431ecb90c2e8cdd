//! Resolved configuration flowing into a middleware chain.

use std::sync::Arc;

use keel::prelude::*;
use parking_lot::Mutex;
use serde_json::json;

#[tokio::test]
async fn resolved_config_parametrizes_middleware() {
    let mut registry = HookRegistry::new();
    registry.register(
        HookPhase::Config,
        "limits",
        hook_fn("max-body", |record: &mut ExecutionRecord| {
            Box::pin(async move {
                record.config.insert("kib", json!(64));
                record.config.insert("maxBody", json!("${kib * 1024}"));
                HookResult::Ok(())
            })
        }),
    );

    let settings = SettingsLoader::new()
        .with_env_vars([("KEEL__PIPELINE__SNAPSHOT_ENV", "off")])
        .unwrap()
        .load()
        .unwrap();
    let pipeline = ConfigurationPipeline::new(Arc::new(registry)).with_settings(settings.pipeline);
    let ctx = CliContext::create(
        &pipeline,
        PackageDescriptor::new("shop", "1.0.0", "/work/shop"),
        CliOptions::new(),
        false,
    )
    .await
    .unwrap();

    let backend = Arc::new(ctx.config.get(&TargetId::backend()).cloned().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    let chain = MiddlewareChain::new()
        .with(RequestIdMiddleware::new())
        .with(middleware_fn("limit", move |ctx: &mut RequestContext, next| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                let max = ctx.config_value("maxBody").and_then(ConfigValue::as_u64);
                log.lock().push(max);
                next.run(ctx).await
            })
        }));

    let mut request = RequestContext::new().with_config(backend);
    chain.run(&mut request).await.unwrap();

    assert_eq!(*seen.lock(), vec![Some(65_536)]);
}
