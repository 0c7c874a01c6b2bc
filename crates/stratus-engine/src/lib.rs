//! Plugin orchestration core for the Stratus deployment tool.
//!
//! # Architecture
//!
//! Deployment commands (create-role, deploy-policies, …) are thin consumers
//! of a small in-process framework with four parts:
//!
//! - **Registry** — an ordered list of [`PluginDescriptor`]s; registration
//!   order is the authoritative hook execution order.
//! - **Config store** — a nested mapping seeded from the project
//!   configuration; each plugin's defaults are merged with the project
//!   section under its camel-cased name at registration.
//! - **Hook dispatcher** — [`Engine::fire`] folds an argument tuple through
//!   every plugin that handles the event, strictly sequentially, failing
//!   fast on the first handler error.
//! - **Extension resolver** — [`Engine::call`] invokes a callable registered
//!   under a `"plugin:extension"` key, falling back to an identity
//!   passthrough of the last argument.
//!
//! ```text
//! ┌─────────────┐  fire("deploy", args)  ┌────────────────────────────────┐
//! │ CLI command │ ──────────────────────▶│ Engine                         │
//! │   layer     │  call("iam:role-arn")  │  args ─▶ plugin "iam"    ─▶    │
//! └─────────────┘                        │       ─▶ plugin "lambda" ─▶ …  │
//!                                        └────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use stratus_engine::{Engine, PluginDescriptor, hook_args};
//!
//! let mut engine = Engine::new(json!({ "iam": { "region": "us-east-1" } }));
//! engine.register_plugin(
//!     PluginDescriptor::new("iam")
//!         .hook("before:deploy", |args| async move { Ok(args) }),
//! )?;
//!
//! let args = engine.fire("before:deploy", hook_args!["my-role"]).await?;
//! ```
//!
//! Plugin *loading* (turning configured identifiers into descriptors) is a
//! separate concern handled by [`loader`] before an engine is assembled.

pub mod engine;
pub mod error;
pub mod hook;
pub mod loader;
pub mod plugin;

pub use engine::{Engine, config_key};
pub use error::{BoxError, EngineError, EngineResult};
pub use hook::{ExtensionFuture, ExtensionHandler, HookArgs, HookFuture, HookHandler};
pub use loader::{LoadReport, MissingPlugin, PluginLoader, PluginSource, StaticSource};
pub use plugin::PluginDescriptor;
