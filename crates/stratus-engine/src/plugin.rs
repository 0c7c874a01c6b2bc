//! Plugin descriptors — the unit registered with the engine.
//!
//! A [`PluginDescriptor`] bundles everything a plugin contributes:
//!
//! - **Hooks**: one async handler per event name, run inside the engine's
//!   sequential dispatch fold.
//! - **Extensions**: named callables other plugins (or command code) invoke
//!   directly through [`Engine::call`](crate::Engine::call).
//! - **Config**: plugin-owned defaults, merged with the project section at
//!   registration time.
//!
//! Descriptors are built with an owned builder API:
//!
//! ```rust,ignore
//! use serde_json::json;
//! use stratus_engine::{PluginDescriptor, hook_args};
//!
//! let iam = PluginDescriptor::new("iam-policies")
//!     .with_config(json!({ "region": "us-east-1", "timeout": 30 }))
//!     .hook("before:deploy", |args| async move { Ok(args) })
//!     .extension("role-arn", |args| async move {
//!         Ok(json!(format!("arn:aws:iam::{}", args[0])))
//!     });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Map, Value};

use crate::error::BoxError;
use crate::hook::{ExtensionHandler, HookArgs, HookHandler};

/// A plugin's contribution record: name, hooks, extensions, and defaults.
pub struct PluginDescriptor {
    name: String,
    hooks: HashMap<String, HookHandler>,
    extensions: HashMap<String, ExtensionHandler>,
    config: Value,
}

impl PluginDescriptor {
    /// Creates a descriptor with the given name and no contributions.
    ///
    /// The name must be non-empty or registration will fail with
    /// [`EngineError::InvalidPlugin`](crate::EngineError::InvalidPlugin).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: HashMap::new(),
            extensions: HashMap::new(),
            config: Value::Object(Map::new()),
        }
    }

    /// Sets the plugin's default configuration.
    ///
    /// Expected to be a JSON object; the project section found at the
    /// plugin's camel-cased name is shallow-merged over it at registration.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Registers the async handler for `event`.
    ///
    /// One handler per event per plugin; a second registration for the same
    /// event replaces the first.
    pub fn hook<F, Fut>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HookArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HookArgs, BoxError>> + Send + 'static,
    {
        self.hooks
            .insert(event.into(), Arc::new(move |args| handler(args).boxed()));
        self
    }

    /// Registers the async extension callable named `name`.
    pub fn extension<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.extensions
            .insert(name.into(), Arc::new(move |args| handler(args).boxed()));
        self
    }

    /// Registers a synchronous extension; its return value is normalized
    /// into an already-settled future.
    pub fn extension_fn<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.extensions.insert(
            name.into(),
            Arc::new(move |args| futures::future::ready(handler(args)).boxed()),
        );
        self
    }

    /// The plugin's unique identifier (also its config lookup key, after
    /// camel-casing).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin's own default configuration.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Returns `true` if this plugin implements a handler for `event`.
    pub fn handles(&self, event: &str) -> bool {
        self.hooks.contains_key(event)
    }

    /// Event names this plugin hooks, in no particular order.
    pub fn hooked_events(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    pub(crate) fn hook_handler(&self, event: &str) -> Option<&HookHandler> {
        self.hooks.get(event)
    }

    pub(crate) fn extension_handler(&self, name: &str) -> Option<&ExtensionHandler> {
        self.extensions.get(name)
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook_args;
    use serde_json::json;
    use tokio_test::block_on;

    #[test]
    fn builder_collects_contributions() {
        let plugin = PluginDescriptor::new("lambda")
            .with_config(json!({ "memory": 128 }))
            .hook("before:deploy", |args| async move { Ok(args) })
            .extension_fn("double", |args| {
                let n = args[0].as_i64().unwrap_or(0);
                Ok(json!(n * 2))
            });

        assert_eq!(plugin.name(), "lambda");
        assert!(plugin.handles("before:deploy"));
        assert!(!plugin.handles("after:deploy"));
        assert!(plugin.extension_handler("double").is_some());
        assert_eq!(plugin.config()["memory"], json!(128));
    }

    #[test]
    fn registered_handlers_are_invocable() {
        let plugin = PluginDescriptor::new("lambda")
            .hook("deploy", |args| async move { Ok(args) })
            .extension_fn("double", |args| {
                let n = args[0].as_i64().unwrap_or(0);
                Ok(json!(n * 2))
            });

        let hook = plugin.hook_handler("deploy").unwrap();
        let out = block_on(hook(hook_args!["x"])).unwrap();
        assert_eq!(out, hook_args!["x"]);

        let ext = plugin.extension_handler("double").unwrap();
        let out = block_on(ext(vec![json!(21)])).unwrap();
        assert_eq!(out, json!(42));
    }

    #[test]
    fn second_hook_for_same_event_replaces_first() {
        let plugin = PluginDescriptor::new("p")
            .hook("deploy", |args| async move { Ok(args) })
            .hook("deploy", |args| async move { Ok(args) });

        assert_eq!(plugin.hooked_events().count(), 1);
    }
}
