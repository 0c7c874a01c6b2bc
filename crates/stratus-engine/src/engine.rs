//! The orchestrator: plugin registry, config store, hook dispatch, and
//! extension resolution.
//!
//! # Dispatch model
//!
//! [`Engine::fire`] runs an **asynchronous, strictly sequential left fold**
//! over the registry: plugin *i*'s handler has fully completed, and its
//! transformed tuple been observed, before plugin *i+1*'s handler starts.
//! There is no concurrent invocation of two plugins' handlers within one
//! `fire` call, which is what makes state a plugin keeps on itself safe to
//! touch from inside a hook without locking.
//!
//! Concurrent top-level `fire` calls into the same engine are not defended
//! against; callers must treat the interleaving of two independent chains as
//! undefined.
//!
//! # Ordering
//!
//! Registration order is the authoritative execution order. Hook composition
//! is not commutative: two plugins implementing the same event observe each
//! other's output in registration order.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{Instrument, Level, debug, span, warn};

use crate::error::{EngineError, EngineResult};
use crate::hook::HookArgs;
use crate::plugin::PluginDescriptor;

/// Converts a plugin name to its camel-cased config key.
///
/// `-`, `_`, `.` and spaces separate words; the first word keeps a lowercase
/// initial, subsequent words are capitalized. `"create-role"` becomes
/// `"createRole"`.
pub fn config_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.' | ' ') {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Shallow merge: entries of `over` win over entries of `base` at the top
/// level. Non-object `over` values replace `base` wholesale.
fn merge_config(base: Value, over: Option<Value>) -> Value {
    match (base, over) {
        (base, None) => base,
        (Value::Object(mut base), Some(Value::Object(over))) => {
            for (k, v) in over {
                base.insert(k, v);
            }
            Value::Object(base)
        }
        (_, Some(over)) => over,
    }
}

/// The plugin orchestrator.
///
/// One engine is constructed per process and passed by reference into every
/// command and plugin-loading step; there is no global instance. The config
/// store is seeded once at construction and written only during
/// [`register_plugin`](Engine::register_plugin).
pub struct Engine {
    /// Nested config mapping; per-plugin sections live under camel-cased keys.
    config: Map<String, Value>,
    /// Registration order is hook execution order.
    plugins: Vec<PluginDescriptor>,
    /// Optional per-handler limit applied at the dispatch boundary.
    hook_timeout: Option<Duration>,
}

impl Engine {
    /// Creates an engine seeded with the project configuration.
    ///
    /// `project` is expected to be a JSON object; anything else seeds an
    /// empty store.
    pub fn new(project: Value) -> Self {
        let config = match project {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!(found = %kind_of(&other), "project config is not an object, ignoring");
                Map::new()
            }
        };
        Self {
            config,
            plugins: Vec::new(),
            hook_timeout: None,
        }
    }

    /// Applies a per-hook-invocation timeout.
    ///
    /// The original design had none: a handler that never settles stalls
    /// the chain forever. Enabling this bounds every handler invocation and
    /// surfaces a stall as [`EngineError::HookTimeout`].
    pub fn with_hook_timeout(mut self, limit: Duration) -> Self {
        self.hook_timeout = Some(limit);
        self
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Registers a plugin, merging its config with the project section.
    ///
    /// The project subsection found under the plugin's camel-cased name is
    /// shallow-merged over the plugin's defaults (project values win) and the
    /// result is stored back under that key. The descriptor is appended to
    /// the registry; its position fixes its place in every hook chain.
    ///
    /// Duplicate names are accepted but logged: name-based lookup resolves to
    /// the first registration only.
    ///
    /// Returns `&mut Self` for chaining.
    pub fn register_plugin(&mut self, plugin: PluginDescriptor) -> EngineResult<&mut Self> {
        if plugin.name().is_empty() {
            return Err(EngineError::InvalidPlugin);
        }
        if self.is_plugin_registered(plugin.name()) {
            warn!(
                plugin = %plugin.name(),
                "duplicate plugin name; lookups resolve to the first registration"
            );
        }

        let key = config_key(plugin.name());
        let merged = merge_config(plugin.config().clone(), self.config.get(&key).cloned());
        self.config.insert(key, merged);

        debug!(plugin = %plugin.name(), "plugin registered");
        self.plugins.push(plugin);
        Ok(self)
    }

    /// Returns the first registered plugin with the given name.
    pub fn get_plugin(&self, name: &str) -> EngineResult<&PluginDescriptor> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| EngineError::PluginNotFound(name.to_string()))
    }

    /// Returns `true` if any registered plugin has the given name.
    pub fn is_plugin_registered(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    // =========================================================================
    // Hook dispatch
    // =========================================================================

    /// Fires `event`, folding `args` through every plugin in registration
    /// order.
    ///
    /// Plugins without a handler for `event` pass the tuple through
    /// unchanged. The first handler error aborts the chain: downstream
    /// handlers never run, nothing is retried, and side effects of earlier
    /// handlers are not rolled back. Every handler must return a tuple of the
    /// same arity it received.
    pub async fn fire(&self, event: &str, args: HookArgs) -> EngineResult<HookArgs> {
        let span = span!(Level::DEBUG, "fire", event = %event, arity = args.arity());
        self.fold_hooks(event, args).instrument(span).await
    }

    async fn fold_hooks(&self, event: &str, args: HookArgs) -> EngineResult<HookArgs> {
        let expected = args.arity();
        let mut acc = args;

        for plugin in &self.plugins {
            let Some(handler) = plugin.hook_handler(event) else {
                continue;
            };
            debug!(plugin = %plugin.name(), "running hook");

            let fut = handler(acc);
            let result = match self.hook_timeout {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(EngineError::HookTimeout {
                            event: event.to_string(),
                            plugin: plugin.name().to_string(),
                            limit,
                        });
                    }
                },
                None => fut.await,
            };

            let next = result.map_err(|source| EngineError::HookFailed {
                event: event.to_string(),
                plugin: plugin.name().to_string(),
                source,
            })?;
            if next.arity() != expected {
                return Err(EngineError::ArityMismatch {
                    event: event.to_string(),
                    plugin: plugin.name().to_string(),
                    expected,
                    got: next.arity(),
                });
            }
            acc = next;
        }
        Ok(acc)
    }

    // =========================================================================
    // Extension resolution
    // =========================================================================

    /// Invokes the extension registered under `key` (`"plugin:extension"`).
    ///
    /// If no plugin provides the extension (including malformed keys), the
    /// call resolves to the **last** argument unchanged (`Value::Null` when
    /// `args` is empty). This identity-passthrough default lets callers
    /// invoke an optional extension point without checking for its
    /// existence first.
    pub async fn call(&self, key: &str, args: Vec<Value>) -> EngineResult<Value> {
        let handler = key.split_once(':').and_then(|(plugin, ext)| {
            self.plugins
                .iter()
                .find(|p| p.name() == plugin && p.extension_handler(ext).is_some())
                .and_then(|p| p.extension_handler(ext))
        });

        match handler {
            Some(handler) => {
                debug!(extension = %key, "invoking extension");
                handler(args)
                    .await
                    .map_err(|source| EngineError::ExtensionFailed {
                        key: key.to_string(),
                        source,
                    })
            }
            None => Ok(args.into_iter().next_back().unwrap_or(Value::Null)),
        }
    }

    // =========================================================================
    // Config store
    // =========================================================================

    /// Walks the config store along a dotted path (`"iam.region"`).
    ///
    /// Returns `None` as soon as a segment is missing or an intermediate
    /// value is not an object. Never fails.
    pub fn get_config(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.config.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// The entire config mapping.
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("hook_timeout", &self.hook_timeout)
            .finish()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook_args;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn append_suffix(suffix: &'static str) -> PluginDescriptor {
        PluginDescriptor::new(suffix.to_lowercase()).hook("deploy", move |args| async move {
            let tagged = format!("{}-{suffix}", args.first().unwrap().as_str().unwrap());
            Ok(args.with_value(0, json!(tagged)))
        })
    }

    #[test]
    fn config_key_camel_cases_names() {
        assert_eq!(config_key("create-role"), "createRole");
        assert_eq!(config_key("deploy_lambda_function"), "deployLambdaFunction");
        assert_eq!(config_key("iam"), "iam");
        assert_eq!(config_key("Iam"), "iam");
        assert_eq!(config_key("--leading"), "leading");
    }

    #[test]
    fn register_rejects_unnamed_plugin() {
        let mut engine = Engine::default();
        let err = engine.register_plugin(PluginDescriptor::new("")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlugin));
    }

    #[test]
    fn registration_chains_and_lookup_matches_first() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("iam").with_config(json!({ "v": 1 })))
            .unwrap()
            .register_plugin(PluginDescriptor::new("iam").with_config(json!({ "v": 2 })))
            .unwrap();

        assert_eq!(engine.plugin_count(), 2);
        assert!(engine.is_plugin_registered("iam"));
        assert!(!engine.is_plugin_registered("lambda"));
        // First registration wins for name-based lookup.
        assert_eq!(engine.get_plugin("iam").unwrap().config()["v"], json!(1));
        assert!(matches!(
            engine.get_plugin("lambda"),
            Err(EngineError::PluginNotFound(_))
        ));
    }

    #[test]
    fn project_config_overrides_plugin_defaults() {
        let mut engine = Engine::new(json!({ "createRole": { "timeout": 60 } }));
        engine
            .register_plugin(
                PluginDescriptor::new("create-role")
                    .with_config(json!({ "timeout": 30, "path": "/" })),
            )
            .unwrap();

        assert_eq!(
            engine.get_config("createRole"),
            Some(&json!({ "timeout": 60, "path": "/" }))
        );
    }

    #[test]
    fn plugin_defaults_stored_when_project_section_absent() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("lambda").with_config(json!({ "memory": 128 })))
            .unwrap();

        assert_eq!(engine.get_config("lambda.memory"), Some(&json!(128)));
    }

    #[test]
    fn nested_config_lookup_is_total() {
        let engine = Engine::new(json!({ "iam": { "region": "us-east-1" } }));

        assert_eq!(engine.get_config("iam.region"), Some(&json!("us-east-1")));
        assert_eq!(engine.get_config("iam.missing.deep"), None);
        assert_eq!(engine.get_config("iam.region.deeper"), None);
        assert_eq!(engine.get_config(""), None);
        assert_eq!(engine.config().len(), 1);
    }

    #[tokio::test]
    async fn fire_on_empty_registry_is_identity() {
        let engine = Engine::default();
        let args = hook_args!["x", { "stage": "dev" }];
        let out = engine.fire("deploy", args.clone()).await.unwrap();
        assert_eq!(out, args);
    }

    #[tokio::test]
    async fn fire_passes_through_plugins_without_the_hook() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("a").hook("other", |args| async move {
                Ok(args.with_value(0, json!("mutated")))
            }))
            .unwrap()
            .register_plugin(PluginDescriptor::new("b"))
            .unwrap();

        let out = engine.fire("deploy", hook_args!["x"]).await.unwrap();
        assert_eq!(out, hook_args!["x"]);
    }

    #[tokio::test]
    async fn hook_composition_follows_registration_order() {
        let mut forward = Engine::default();
        forward
            .register_plugin(append_suffix("A"))
            .unwrap()
            .register_plugin(append_suffix("B"))
            .unwrap();
        let out = forward.fire("deploy", hook_args!["x"]).await.unwrap();
        assert_eq!(out, hook_args!["x-A-B"]);

        let mut reversed = Engine::default();
        reversed
            .register_plugin(append_suffix("B"))
            .unwrap()
            .register_plugin(append_suffix("A"))
            .unwrap();
        let out = reversed.fire("deploy", hook_args!["x"]).await.unwrap();
        assert_eq!(out, hook_args!["x-B-A"]);
    }

    #[tokio::test]
    async fn failing_hook_aborts_the_chain() {
        let third_ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&third_ran);

        let mut engine = Engine::default();
        engine
            .register_plugin(append_suffix("A"))
            .unwrap()
            .register_plugin(PluginDescriptor::new("failing").hook("deploy", |_| async move {
                Err("access denied".into())
            }))
            .unwrap()
            .register_plugin(PluginDescriptor::new("third").hook("deploy", move |args| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(args)
                }
            }))
            .unwrap();

        let err = engine.fire("deploy", hook_args!["x"]).await.unwrap_err();
        match err {
            EngineError::HookFailed { event, plugin, source } => {
                assert_eq!(event, "deploy");
                assert_eq!(plugin, "failing");
                assert_eq!(source.to_string(), "access denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(third_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn arity_change_is_rejected() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("shrinking").hook("deploy", |_| async move {
                Ok(HookArgs::default())
            }))
            .unwrap();

        let err = engine.fire("deploy", hook_args!["x", "y"]).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::ArityMismatch { expected: 2, got: 0, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_hook_times_out_when_configured() {
        let mut engine = Engine::default().with_hook_timeout(Duration::from_millis(50));
        engine
            .register_plugin(PluginDescriptor::new("stalled").hook("deploy", |_| async move {
                Ok(futures::future::pending::<HookArgs>().await)
            }))
            .unwrap();

        let err = engine.fire("deploy", hook_args!["x"]).await.unwrap_err();
        assert!(matches!(err, EngineError::HookTimeout { .. }));
    }

    #[tokio::test]
    async fn unregistered_extension_passes_through_last_argument() {
        let engine = Engine::default();

        let out = engine
            .call("nobody:home", vec![json!(1), json!("last")])
            .await
            .unwrap();
        assert_eq!(out, json!("last"));

        // Malformed key, no namespace separator.
        let out = engine.call("bare", vec![json!(7)]).await.unwrap();
        assert_eq!(out, json!(7));

        let out = engine.call("nobody:home", vec![]).await.unwrap();
        assert_eq!(out, Value::Null);
    }

    #[tokio::test]
    async fn duplicate_name_cannot_shadow_an_extension_it_lacks() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("iam"))
            .unwrap()
            .register_plugin(
                PluginDescriptor::new("iam").extension_fn("arn", |_| Ok(json!("arn:aws:iam"))),
            )
            .unwrap();

        // The first "iam" has no "arn" extension; lookup continues to the
        // second registration instead of falling back to passthrough.
        let out = engine.call("iam:arn", vec![json!("ignored")]).await.unwrap();
        assert_eq!(out, json!("arn:aws:iam"));
    }

    #[tokio::test]
    async fn registered_extension_is_invoked() {
        let mut engine = Engine::default();
        engine
            .register_plugin(PluginDescriptor::new("P").extension_fn("double", |args| {
                let n = args
                    .first()
                    .and_then(Value::as_i64)
                    .ok_or("expected a number")?;
                Ok(json!(n * 2))
            }))
            .unwrap();

        assert_eq!(engine.call("P:double", vec![json!(5)]).await.unwrap(), json!(10));

        let err = engine.call("P:double", vec![json!("five")]).await.unwrap_err();
        assert!(matches!(err, EngineError::ExtensionFailed { .. }));
    }
}
