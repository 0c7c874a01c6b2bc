//! Bootstrap glue: from configuration to a ready engine.

use std::time::Duration;

use tracing::info;

use stratus_engine::{Engine, PluginLoader};

use crate::config::StratusConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Builds an [`Engine`] from the loaded configuration.
///
/// The configured plugin identifiers are resolved through `loader`; if any
/// identifier stays unresolved, bootstrap fails with a diagnostic naming all
/// of them — a misspelled plugin should abort startup, not silently drop out
/// of every hook chain. Resolved plugins are registered in configured order,
/// which fixes the hook execution order.
pub async fn build_engine(config: &StratusConfig, loader: &PluginLoader) -> RuntimeResult<Engine> {
    let report = loader.load(&config.plugins).await;
    if !report.is_complete() {
        return Err(RuntimeError::MissingPlugins(report.missing));
    }

    let mut engine = Engine::new(config.project.clone());
    if let Some(ms) = config.engine.hook_timeout_ms {
        engine = engine.with_hook_timeout(Duration::from_millis(ms));
    }

    for plugin in report.resolved {
        engine.register_plugin(plugin)?;
    }

    info!(plugins = engine.plugin_count(), "engine ready");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use serde_json::json;
    use stratus_engine::{PluginDescriptor, StaticSource};

    fn sources() -> PluginLoader {
        PluginLoader::new().source(
            StaticSource::new("builtin")
                .provide("create-role", || {
                    PluginDescriptor::new("create-role").with_config(json!({ "timeout": 30 }))
                })
                .provide("lambda", || PluginDescriptor::new("lambda")),
        )
    }

    #[tokio::test]
    async fn builds_engine_with_configured_plugins() {
        let config = StratusConfig {
            plugins: vec!["create-role".to_string(), "lambda".to_string()],
            project: json!({ "createRole": { "timeout": 60 } }),
            engine: EngineSettings {
                hook_timeout_ms: Some(5_000),
            },
            ..Default::default()
        };

        let engine = build_engine(&config, &sources()).await.unwrap();
        assert_eq!(engine.plugin_count(), 2);
        assert!(engine.is_plugin_registered("lambda"));
        assert_eq!(engine.get_config("createRole.timeout"), Some(&json!(60)));
    }

    #[tokio::test]
    async fn unresolved_plugin_aborts_bootstrap() {
        let config = StratusConfig {
            plugins: vec!["create-role".to_string(), "dynamo".to_string()],
            ..Default::default()
        };

        let err = build_engine(&config, &sources()).await.unwrap_err();
        match err {
            RuntimeError::MissingPlugins(missing) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].id, "dynamo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
