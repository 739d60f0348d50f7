// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// binary = "docker"
/// image = "node:20-alpine"
/// workdir = "/app"
/// namespace = "nodejob-"
///
/// [timeouts]
/// install = "10s"
/// run_once = "30s"
/// control = "30s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Container engine settings from `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,

    /// Invocation bounds from `[timeouts]`.
    #[serde(default)]
    pub timeouts: TimeoutSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Container engine CLI (`docker`, `podman`, ...).
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Base image every job runs in.
    #[serde(default = "default_image")]
    pub image: String,

    /// In-container directory the project is mounted at.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Prefix carried by every container name this system manages.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_binary() -> String {
    "docker".to_string()
}

fn default_image() -> String {
    "node:20-alpine".to_string()
}

fn default_workdir() -> String {
    "/app".to_string()
}

fn default_namespace() -> String {
    "nodejob-".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            image: default_image(),
            workdir: default_workdir(),
            namespace: default_namespace(),
        }
    }
}

/// `[timeouts]` section.
///
/// Values use the `"250ms" | "3s" | "1m" | "2h"` duration grammar.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutSection {
    /// Bound on `npm install`.
    #[serde(default = "default_install_timeout")]
    pub install: String,

    /// Bound on one-shot script runs. Must not be shorter than `install`.
    #[serde(default = "default_run_once_timeout")]
    pub run_once: String,

    /// Bound on introspection and teardown calls (`ps`, `inspect`, `rm`, `logs`).
    #[serde(default = "default_control_timeout")]
    pub control: String,
}

fn default_install_timeout() -> String {
    "10s".to_string()
}

fn default_run_once_timeout() -> String {
    "30s".to_string()
}

fn default_control_timeout() -> String {
    "30s".to_string()
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            install: default_install_timeout(),
            run_once: default_run_once_timeout(),
            control: default_control_timeout(),
        }
    }
}

/// Validated runtime settings shared (read-only) by every component.
///
/// Only constructible through `TryFrom<RawConfigFile>`, so holders can rely
/// on the invariants checked in `validate.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub engine_binary: String,
    pub image: String,
    pub workdir: PathBuf,
    pub namespace: String,
    pub install_timeout: Duration,
    pub run_once_timeout: Duration,
    pub control_timeout: Duration,
}

impl Settings {
    pub(crate) fn new_unchecked(
        engine_binary: String,
        image: String,
        workdir: PathBuf,
        namespace: String,
        install_timeout: Duration,
        run_once_timeout: Duration,
        control_timeout: Duration,
    ) -> Self {
        Self {
            engine_binary,
            image,
            workdir,
            namespace,
            install_timeout,
            run_once_timeout,
            control_timeout,
        }
    }

    /// Override the engine binary (e.g. from `--engine`).
    pub fn with_engine_binary(mut self, binary: impl Into<String>) -> Self {
        self.engine_binary = binary.into();
        self
    }

    /// Override the base image (e.g. from `--image`).
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        // The built-in defaults always validate.
        Settings::new_unchecked(
            default_binary(),
            default_image(),
            PathBuf::from(default_workdir()),
            default_namespace(),
            Duration::from_secs(10),
            Duration::from_secs(30),
            Duration::from_secs(30),
        )
    }
}
