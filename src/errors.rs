// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodejobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to read manifest {path:?}: {reason}")]
    ManifestError { path: PathBuf, reason: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid port mapping '{0}': expected \"host:container\"")]
    InvalidPortMapping(String),

    #[error("Container engine failure: {0}")]
    EngineFailure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NodejobError>;
