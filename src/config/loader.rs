// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawConfigFile, Settings};
use crate::errors::{NodejobError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it into [`Settings`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw_config = load_from_path(&path)?;
    let settings = Settings::try_from(raw_config)?;
    Ok(settings)
}

/// Resolve settings for startup.
///
/// - An explicitly requested file must exist.
/// - The implicit default file is optional; built-in defaults apply when it
///   is absent.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(NodejobError::ConfigError(format!(
                    "config file {:?} does not exist",
                    path
                )));
            }
            load_and_validate(path)
        }
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
            } else {
                debug!(path = ?path, "no config file found; using built-in defaults");
                Ok(Settings::default())
            }
        }
    }
}

/// Default config location: `Nodejob.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Nodejob.toml")
}
