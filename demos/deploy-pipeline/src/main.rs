//! Deployment Pipeline Example
//!
//! Demonstrates the Stratus plugin engine: two plugins cooperating on the
//! `before:deploy` hook chain, an extension invoked by key, and project
//! config overriding plugin defaults.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package deploy-pipeline
//! ```

use anyhow::Result;
use serde_json::json;
use stratus::prelude::*;
use tracing::info;

/// Validates the deployment request and stamps it with the target region.
fn iam_plugin() -> PluginDescriptor {
    PluginDescriptor::new("iam")
        .with_config(json!({ "region": "us-east-1" }))
        .hook("before:deploy", |args| async move {
            let request = args.first().cloned().unwrap_or_default();
            if request.get("role").is_none() {
                return Err("deployment request has no role".into());
            }
            info!(role = %request["role"], "iam: request validated");
            Ok(args)
        })
        .extension_fn("role-arn", |args| {
            let role = args
                .first()
                .and_then(|v| v.as_str())
                .ok_or("expected a role name")?;
            Ok(json!(format!("arn:aws:iam::123456789012:role/{role}")))
        })
}

/// Attaches the resolved function package to the request.
fn lambda_plugin() -> PluginDescriptor {
    PluginDescriptor::new("lambda").hook("before:deploy", |args| async move {
        let mut request = args.first().cloned().unwrap_or_default();
        request["package"] = json!("target/lambda.zip");
        info!("lambda: package attached");
        Ok(args.with_value(0, request))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::new()
        .merge(StratusConfig {
            plugins: vec!["iam".to_string(), "lambda".to_string()],
            project: json!({ "iam": { "region": "eu-west-1" } }),
            ..Default::default()
        })
        .load()?;
    logging::init_from_config(&config.logging);

    let loader = PluginLoader::new().source(
        StaticSource::new("builtin")
            .provide("iam", iam_plugin)
            .provide("lambda", lambda_plugin),
    );
    let engine = build_engine(&config, &loader).await?;

    // Project config overrode the iam plugin's default region.
    info!(region = ?engine.get_config("iam.region"), "effective region");

    let out = engine
        .fire("before:deploy", hook_args![{ "role": "deployer" }])
        .await?;
    info!(request = %out.first().unwrap(), "pipeline finished");

    let arn = engine.call("iam:role-arn", vec![json!("deployer")]).await?;
    info!(%arn, "resolved role ARN");

    Ok(())
}
