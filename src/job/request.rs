// src/job/request.rs

use std::path::PathBuf;

use crate::types::{JobMode, PortMapping};

/// The caller's intent for a single call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub project_path: PathBuf,
    pub script_name: Option<String>,
    pub mode: JobMode,
    pub container_name_hint: Option<String>,
    pub port_mapping: Option<PortMapping>,
}

impl JobRequest {
    fn new(project_path: impl Into<PathBuf>, script_name: Option<String>, mode: JobMode) -> Self {
        Self {
            project_path: project_path.into(),
            script_name,
            mode,
            container_name_hint: None,
            port_mapping: None,
        }
    }

    /// `npm install` in the project.
    pub fn install(project_path: impl Into<PathBuf>) -> Self {
        Self::new(project_path, None, JobMode::Install)
    }

    /// Run `script` to completion.
    pub fn run_once(project_path: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self::new(project_path, Some(script.into()), JobMode::RunOnce)
    }

    /// Run `script` in a detached, named container.
    pub fn run_persistent(project_path: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self::new(project_path, Some(script.into()), JobMode::RunPersistent)
    }

    /// Blank hints are treated as absent.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.container_name_hint = if hint.trim().is_empty() {
            None
        } else {
            Some(hint.trim().to_string())
        };
        self
    }

    pub fn with_port_mapping(mut self, mapping: PortMapping) -> Self {
        self.port_mapping = Some(mapping);
        self
    }
}
