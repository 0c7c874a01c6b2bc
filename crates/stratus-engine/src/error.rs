//! Error types for the Stratus orchestration engine.

use std::time::Duration;

use thiserror::Error;

/// Boxed error type returned by hook handlers and extensions.
///
/// The engine never inspects these; they are propagated verbatim to the
/// caller wrapped in the matching [`EngineError`] variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by engine operations.
///
/// There is no centralized recovery: every failure is returned to the
/// immediate caller (the CLI command layer), which owns user-facing
/// reporting and exit codes.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A descriptor without a usable name was offered for registration.
    #[error("invalid plugin: descriptor has no name")]
    InvalidPlugin,

    /// No registered plugin matched the requested name.
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    /// A hook handler failed; the remainder of the chain was not run.
    #[error("hook '{event}' failed in plugin '{plugin}'")]
    HookFailed {
        /// Event whose chain was aborted.
        event: String,
        /// Plugin whose handler rejected.
        plugin: String,
        /// The handler's error, unchanged.
        #[source]
        source: BoxError,
    },

    /// A hook handler did not settle within the configured timeout.
    #[error("hook '{event}' in plugin '{plugin}' timed out after {limit:?}")]
    HookTimeout {
        /// Event whose chain was aborted.
        event: String,
        /// Plugin whose handler stalled.
        plugin: String,
        /// The configured per-hook limit.
        limit: Duration,
    },

    /// A hook handler changed the shape of the argument tuple.
    #[error(
        "hook '{event}' in plugin '{plugin}' changed arity: expected {expected}, got {got}"
    )]
    ArityMismatch {
        /// Event whose chain was aborted.
        event: String,
        /// Plugin whose handler broke the contract.
        plugin: String,
        /// Arity of the tuple passed into the chain.
        expected: usize,
        /// Arity the handler returned.
        got: usize,
    },

    /// An invoked extension failed.
    #[error("extension '{key}' failed")]
    ExtensionFailed {
        /// The namespaced `plugin:extension` key.
        key: String,
        /// The extension's error, unchanged.
        #[source]
        source: BoxError,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
