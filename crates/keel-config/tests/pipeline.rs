//! End-to-end resolution across several targets.

use std::path::PathBuf;
use std::sync::Arc;

use keel_config::{CliContext, ConfigurationPipeline, PipelineSettings, SettingsLoader};
use keel_core::{CliOptions, ConfigValue, PackageDescriptor, ProgramInfo, TargetId, TRANSIENT_FIELDS};
use keel_hooks::{hook_fn, ExecutionRecord, HookPhase, HookRegistry, HookResult};
use serde_json::json;

fn package() -> PackageDescriptor {
    let mut manifest = keel_core::ConfigMap::new();
    manifest.insert("description".into(), json!("storefront"));
    PackageDescriptor::new("shop", "2.1.0", "/work/shop").with_manifest(manifest)
}

fn settings() -> PipelineSettings {
    SettingsLoader::new()
        .with_env_vars([
            ("KEEL__PIPELINE__SNAPSHOT_ENV", "false"),
            ("KEEL__PIPELINE__RUNTIME_ROOT", "/work/shop"),
        ])
        .unwrap()
        .load()
        .unwrap()
        .pipeline
}

fn registry() -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register(
        HookPhase::Config,
        "web",
        hook_fn("frontend-port", |record: &mut ExecutionRecord| {
            Box::pin(async move {
                if record.target == TargetId::frontend() {
                    record.config.insert("port", json!(8080));
                    record.config.insert("title", json!("${pkg.description | upper}"));
                }
                HookResult::Ok(())
            })
        }),
    );
    registry.register(
        HookPhase::Config,
        "proxy",
        hook_fn("backend-cors", |record: &mut ExecutionRecord| {
            Box::pin(async move {
                if record.target != TargetId::backend() {
                    return HookResult::Ok(());
                }
                let origin = record
                    .container
                    .get(&TargetId::frontend())
                    .and_then(|frontend| frontend.get("port"))
                    .cloned()
                    .ok_or("frontend must resolve first")?;
                record.config.insert("corsPort", origin);
                record
                    .resolver
                    .register_transform("suffix", |_scope, input, args| {
                        let suffix = args.first().and_then(ConfigValue::as_str).unwrap_or_default();
                        Ok(json!(format!("{}{suffix}", input.as_str().unwrap_or_default())))
                    });
                record.config.insert("bin", json!("${pkg.name | suffix('-server')}"));
                HookResult::Ok(())
            })
        }),
    );
    registry
}

#[tokio::test]
async fn no_transient_field_survives() {
    let pipeline = ConfigurationPipeline::new(Arc::new(registry())).with_settings(settings());
    let resolved = pipeline
        .resolve(&[], &package(), &CliOptions::new().with_mode(["prod"]))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    for (target, record) in &resolved {
        for field in TRANSIENT_FIELDS {
            assert!(!record.contains_key(field), "{field} survived on {target}");
        }
        assert_eq!(record.ignored_keys().count(), 0);
    }
}

#[tokio::test]
async fn later_targets_see_resolved_siblings() {
    let pipeline = ConfigurationPipeline::new(Arc::new(registry())).with_settings(settings());
    let resolved = pipeline
        .resolve(
            &[TargetId::frontend(), TargetId::backend()],
            &package(),
            &CliOptions::new(),
        )
        .await
        .unwrap();

    let frontend = &resolved[&TargetId::frontend()];
    assert_eq!(frontend.get("title"), Some(&json!("STOREFRONT")));

    let backend = &resolved[&TargetId::backend()];
    assert_eq!(backend.get("corsPort"), Some(&json!(8080)));
    assert_eq!(backend.get("bin"), Some(&json!("shop-server")));
}

#[tokio::test]
async fn target_order_matters() {
    let pipeline = ConfigurationPipeline::new(Arc::new(registry())).with_settings(settings());
    let err = pipeline
        .resolve(&[TargetId::backend()], &package(), &CliOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.target(), &TargetId::backend());
}

#[tokio::test]
async fn cli_context_carries_program_and_options() {
    let pipeline = ConfigurationPipeline::new(Arc::new(registry()))
        .with_settings(settings())
        .with_program(ProgramInfo::new("keel", "0.1.0").with_args(["build"]));

    let options = CliOptions::new()
        .with_mode(["prod"])
        .with_option("verbose", json!(true));
    let ctx = CliContext::create(&pipeline, package(), options, false)
        .await
        .unwrap();

    assert_eq!(ctx.program.args, vec!["build".to_string()]);
    assert_eq!(ctx.package.modes, vec!["prod".to_string()]);
    assert_eq!(ctx.output_dir(), PathBuf::from("/work/shop/dist"));
    assert_eq!(
        ctx.config
            .get(&TargetId::backend())
            .and_then(|backend| backend.get("corsPort")),
        Some(&json!(8080))
    );
}
