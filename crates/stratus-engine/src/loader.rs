//! Plugin loading, separated from dispatch.
//!
//! The loader turns a list of plugin *identifiers* (as they appear in the
//! project configuration) into descriptors before the engine is built.
//! Resolution concerns — which sources exist, in what order they are probed —
//! stay out of the dispatch core, and a failed lookup produces a structured
//! diagnostic instead of being swallowed.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::plugin::PluginDescriptor;

/// A named origin that plugin identifiers can be resolved against.
///
/// Sources are probed in the order they were added to the
/// [`PluginLoader`]; the first source that knows an identifier wins.
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Source name, used in missing-plugin diagnostics.
    fn name(&self) -> &str;

    /// Resolves `id` to a descriptor, or `None` if this source does not
    /// provide it.
    async fn resolve(&self, id: &str) -> Option<PluginDescriptor>;
}

/// An in-memory source backed by descriptor factories.
///
/// Covers built-in plugins and tests; sources that probe the filesystem or
/// the environment implement [`PluginSource`] themselves.
pub struct StaticSource {
    name: String,
    factories: HashMap<String, Box<dyn Fn() -> PluginDescriptor + Send + Sync>>,
}

impl StaticSource {
    /// Creates an empty source with the given diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factories: HashMap::new(),
        }
    }

    /// Registers a factory for the identifier `id`.
    pub fn provide<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> PluginDescriptor + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
        self
    }
}

#[async_trait]
impl PluginSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, id: &str) -> Option<PluginDescriptor> {
        self.factories.get(id).map(|factory| factory())
    }
}

/// Diagnostic for an identifier no source could resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPlugin {
    /// The identifier as given.
    pub id: String,
    /// Names of the sources probed, in probe order.
    pub probed: Vec<String>,
}

impl std::fmt::Display for MissingPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "plugin '{}' not found (probed: {})",
            self.id,
            self.probed.join(", ")
        )
    }
}

/// Outcome of resolving a list of identifiers.
///
/// `resolved` preserves the input order of the identifiers that were found,
/// so registering them in sequence reproduces the configured hook order.
#[derive(Default)]
pub struct LoadReport {
    /// Descriptors for the identifiers that resolved, in input order.
    pub resolved: Vec<PluginDescriptor>,
    /// One diagnostic per identifier that did not resolve, in input order.
    pub missing: Vec<MissingPlugin>,
}

impl LoadReport {
    /// Returns `true` if every identifier resolved.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Ordered collection of plugin sources.
#[derive(Default)]
pub struct PluginLoader {
    sources: Vec<Box<dyn PluginSource>>,
}

impl PluginLoader {
    /// Creates a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source; earlier sources shadow later ones.
    pub fn source(mut self, source: impl PluginSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Resolves every identifier against the sources in order.
    pub async fn load<I, S>(&self, ids: I) -> LoadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = LoadReport::default();
        for id in ids {
            let id = id.as_ref();
            match self.resolve(id).await {
                Some((source, descriptor)) => {
                    debug!(plugin = %id, source = %source, "plugin resolved");
                    report.resolved.push(descriptor);
                }
                None => report.missing.push(MissingPlugin {
                    id: id.to_string(),
                    probed: self.sources.iter().map(|s| s.name().to_string()).collect(),
                }),
            }
        }
        report
    }

    async fn resolve(&self, id: &str) -> Option<(String, PluginDescriptor)> {
        for source in &self.sources {
            if let Some(descriptor) = source.resolve(id).await {
                return Some((source.name().to_string(), descriptor));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> StaticSource {
        StaticSource::new("builtin")
            .provide("iam", || PluginDescriptor::new("iam"))
            .provide("lambda", || PluginDescriptor::new("lambda"))
    }

    #[tokio::test]
    async fn resolves_in_input_order() {
        let loader = PluginLoader::new().source(builtin());
        let report = loader.load(["lambda", "iam"]).await;

        assert!(report.is_complete());
        let names: Vec<_> = report.resolved.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["lambda", "iam"]);
    }

    #[tokio::test]
    async fn earlier_source_shadows_later() {
        let loader = PluginLoader::new()
            .source(StaticSource::new("project").provide("iam", || {
                PluginDescriptor::new("iam").with_config(serde_json::json!({ "from": "project" }))
            }))
            .source(builtin());

        let report = loader.load(["iam"]).await;
        assert_eq!(report.resolved[0].config()["from"], "project");
    }

    #[tokio::test]
    async fn missing_identifier_lists_probed_sources() {
        let loader = PluginLoader::new()
            .source(builtin())
            .source(StaticSource::new("project"));

        let report = loader.load(["iam", "dynamo"]).await;
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(
            report.missing,
            vec![MissingPlugin {
                id: "dynamo".to_string(),
                probed: vec!["builtin".to_string(), "project".to_string()],
            }]
        );
        assert_eq!(
            report.missing[0].to_string(),
            "plugin 'dynamo' not found (probed: builtin, project)"
        );
    }
}
