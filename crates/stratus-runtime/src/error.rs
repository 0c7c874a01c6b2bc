//! Runtime and configuration error types.

use std::path::PathBuf;

use stratus_engine::{EngineError, MissingPlugin};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The configuration could not be parsed or extracted.
    #[error("failed to load configuration: {0}")]
    Parse(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during bootstrap.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more configured plugin identifiers could not be resolved.
    #[error("unresolved plugins: {}", .0.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join(", "))]
    MissingPlugins(Vec<MissingPlugin>),

    /// A resolved plugin was rejected by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for bootstrap operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
