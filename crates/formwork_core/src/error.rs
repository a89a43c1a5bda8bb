//! Error types for formwork_core
//!
//! Widgets themselves never fail: validation failures are data. These errors
//! cover the host runtime (addressing instances and nodes) and configuration
//! loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the host runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No instance is mounted under the identity
    #[error("no mounted instance with identity `{0}`")]
    UnknownInstance(String),

    /// The identity is already mounted
    #[error("identity `{0}` is already mounted")]
    AlreadyMounted(String),

    /// The last rendered tree has no node with this structural key
    #[error("instance `{identity}` has no node keyed `{key}`")]
    NodeNotFound { identity: String, key: String },

    /// The node exists but has no handler for the event
    #[error("node `{key}` has no `{event}` handler")]
    MissingHandler { key: String, event: &'static str },

    /// Invalidations kept arriving after the configured number of passes
    #[error("instance `{identity}` still invalidated after {passes} render passes")]
    RenderLoop { identity: String, passes: usize },
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::FormworkConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
