// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{RawConfigFile, Settings};
use crate::errors::{NodejobError, Result};
use crate::job::is_valid_container_name;

impl TryFrom<RawConfigFile> for Settings {
    type Error = NodejobError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_engine(&raw)?;

        let install = timeout_field("install", &raw.timeouts.install)?;
        let run_once = timeout_field("run_once", &raw.timeouts.run_once)?;
        let control = timeout_field("control", &raw.timeouts.control)?;

        if run_once < install {
            return Err(NodejobError::ConfigError(format!(
                "[timeouts].run_once ({}) must not be shorter than [timeouts].install ({})",
                raw.timeouts.run_once, raw.timeouts.install
            )));
        }

        Ok(Settings::new_unchecked(
            raw.engine.binary,
            raw.engine.image,
            PathBuf::from(raw.engine.workdir),
            raw.engine.namespace,
            install,
            run_once,
            control,
        ))
    }
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    let engine = &cfg.engine;

    if engine.binary.trim().is_empty() {
        return Err(NodejobError::ConfigError(
            "[engine].binary must not be empty".to_string(),
        ));
    }

    if engine.image.trim().is_empty() {
        return Err(NodejobError::ConfigError(
            "[engine].image must not be empty".to_string(),
        ));
    }

    if !engine.workdir.starts_with('/') {
        return Err(NodejobError::ConfigError(format!(
            "[engine].workdir must be an absolute in-container path (got '{}')",
            engine.workdir
        )));
    }

    // The namespace is the leading part of every container name we create,
    // so it has to be a legal name on its own.
    if !is_valid_container_name(&engine.namespace) {
        return Err(NodejobError::ConfigError(format!(
            "[engine].namespace '{}' is not a valid container name prefix",
            engine.namespace
        )));
    }

    Ok(())
}

fn timeout_field(name: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value)
        .map_err(|e| NodejobError::ConfigError(format!("[timeouts].{name}: {e}")))?;

    if dur.is_zero() {
        return Err(NodejobError::ConfigError(format!(
            "[timeouts].{name} must be greater than zero"
        )));
    }

    Ok(dur)
}
