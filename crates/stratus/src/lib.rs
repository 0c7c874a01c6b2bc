//! # Stratus
//!
//! An extensible, plugin-driven deployment tool for cloud infrastructure.
//!
//! ## Overview
//!
//! Every deployment command is a thin consumer of the orchestration engine:
//! plugins register hook handlers and extensions, and commands drive them by
//! firing named events. The engine guarantees deterministic, sequential hook
//! execution in registration order.
//!
//! ```text
//! ┌─────────────┐     ┌────────┐ fire("deploy")  ┌──────────────────────┐
//! │ CLI command │────▶│ Engine │────────────────▶│ plugin "iam"     ─▶  │
//! │   layer     │     │        │────────────────▶│ plugin "lambda"  ─▶  │
//! └─────────────┘     └────────┘                 └──────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use stratus::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let loader = PluginLoader::new().source(
//!         StaticSource::new("builtin").provide("iam", || {
//!             PluginDescriptor::new("iam")
//!                 .hook("before:deploy", |args| async move { Ok(args) })
//!         }),
//!     );
//!
//!     let engine = build_engine(&config, &loader).await?;
//!     engine.fire("before:deploy", hook_args!["my-role"]).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files

pub use stratus_engine as engine;
pub use stratus_runtime as runtime;

pub use stratus_runtime::logging;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use stratus::prelude::*;
/// ```
pub mod prelude {
    // Orchestration core
    pub use stratus_engine::{
        Engine, EngineError, EngineResult, HookArgs, PluginDescriptor,
    };

    // Plugin loading
    pub use stratus_engine::{PluginLoader, PluginSource, StaticSource};

    // Runtime - configuration and bootstrap
    pub use stratus_runtime::{ConfigLoader, StratusConfig, build_engine, logging};

    // Tuple construction
    pub use stratus_engine::hook_args;
}
