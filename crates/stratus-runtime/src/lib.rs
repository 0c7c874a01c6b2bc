//! Stratus runtime — configuration and bootstrap layer.
//!
//! This crate provides the ambient concerns around the orchestration core:
//!
//! - Layered configuration loading (`ConfigLoader`, figment-based)
//! - Logging setup (`LoggingBuilder`, tracing-based)
//! - Bootstrap from configuration to a ready engine (`build_engine`)
//!
//! ```rust,ignore
//! use stratus_runtime::{ConfigLoader, build_engine, logging};
//! use stratus_engine::PluginLoader;
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let loader = PluginLoader::new().source(builtin_plugins());
//! let engine = build_engine(&config, &loader).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigLoader, EngineSettings, LoggingConfig, StratusConfig};
pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::build_engine;

// Re-export tracing for embedders that configure logging through this crate.
pub use tracing;
pub use tracing_subscriber;
