// src/job/resolve.rs

use std::time::Duration;

use tracing::warn;

use crate::config::Settings;
use crate::errors::{NodejobError, Result};
use crate::job::naming::JobId;
use crate::job::request::JobRequest;
use crate::types::JobMode;

/// Label carried by install / run-once containers. Listings skip them.
pub const EPHEMERAL_LABEL: &str = "nodejob.ephemeral";

/// Engine invocation derived from a [`JobRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    /// Present for persistent jobs only.
    pub identifier: Option<JobId>,
    /// Full engine command line, excluding the engine binary.
    pub engine_args: Vec<String>,
    /// Bound on the launching call; `None` for detached launches.
    pub timeout: Option<Duration>,
    /// Name given to an ephemeral container so it can be removed when its
    /// launching call is killed at the deadline.
    pub teardown_handle: Option<JobId>,
}

impl ResolvedJob {
    /// Name and label an ephemeral container. No-op for persistent jobs,
    /// which already carry their identifier.
    pub fn with_teardown_handle(mut self, handle: JobId) -> Self {
        if self.identifier.is_some() {
            return self;
        }
        // Right after `run --rm`.
        let at = 2.min(self.engine_args.len());
        self.engine_args.splice(
            at..at,
            [
                "--name".to_string(),
                handle.to_string(),
                "--label".to_string(),
                format!("{EPHEMERAL_LABEL}=true"),
            ],
        );
        self.teardown_handle = Some(handle);
        self
    }
}

/// Decide identifier, command form and timeout for `request`.
///
/// Identical inputs produce identical arguments; only the fallback
/// identifier of an un-hinted persistent job varies between calls.
pub fn resolve(settings: &Settings, request: &JobRequest) -> Result<ResolvedJob> {
    if !request.project_path.is_absolute() {
        return Err(NodejobError::InvalidArguments(format!(
            "projectPath must be absolute (got {:?})",
            request.project_path
        )));
    }

    match request.mode {
        JobMode::Install => Ok(ResolvedJob {
            identifier: None,
            engine_args: ephemeral_args(settings, request, "npm install".to_string()),
            timeout: Some(settings.install_timeout),
            teardown_handle: None,
        }),
        JobMode::RunOnce => {
            let script = required_script(request)?;
            if request.port_mapping.is_some() || request.container_name_hint.is_some() {
                warn!(
                    script,
                    "containerNameHint/portMapping only apply to persistent runs; ignoring"
                );
            }
            Ok(ResolvedJob {
                identifier: None,
                engine_args: ephemeral_args(settings, request, npm_run(script)),
                timeout: Some(settings.run_once_timeout),
                teardown_handle: None,
            })
        }
        JobMode::RunPersistent => {
            let script = required_script(request)?;
            let id = match &request.container_name_hint {
                Some(hint) => JobId::from_hint(&settings.namespace, hint)?,
                None => JobId::generate(&settings.namespace, script),
            };

            let mut args = vec![
                "run".to_string(),
                "-d".to_string(),
                "--name".to_string(),
                id.to_string(),
            ];
            if let Some(ports) = request.port_mapping {
                args.push("-p".to_string());
                args.push(ports.to_string());
            }
            args.extend(mount_args(settings, request));
            args.extend(shell_args(settings, npm_run(script)));

            Ok(ResolvedJob {
                identifier: Some(id),
                engine_args: args,
                timeout: None,
                teardown_handle: None,
            })
        }
    }
}

fn required_script(request: &JobRequest) -> Result<&str> {
    match request.script_name.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(NodejobError::InvalidArguments(format!(
            "scriptName is required for {} jobs",
            request.mode
        ))),
    }
}

fn ephemeral_args(settings: &Settings, request: &JobRequest, command: String) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string()];
    args.extend(mount_args(settings, request));
    args.extend(shell_args(settings, command));
    args
}

/// Read-write bind of the project at the fixed working directory.
fn mount_args(settings: &Settings, request: &JobRequest) -> Vec<String> {
    let workdir = settings.workdir.display().to_string();
    vec![
        "-v".to_string(),
        format!("{}:{}", request.project_path.display(), workdir),
        "-w".to_string(),
        workdir,
    ]
}

/// Image plus the single in-container command string, handed to the
/// container's own shell.
fn shell_args(settings: &Settings, command: String) -> Vec<String> {
    vec![
        settings.image.clone(),
        "sh".to_string(),
        "-c".to_string(),
        command,
    ]
}

fn npm_run(script: &str) -> String {
    format!("npm run {}", shell_quote(script))
}

/// Quote `s` for a POSIX shell unless it is made of obviously safe characters.
fn shell_quote(s: &str) -> String {
    let safe = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/' | '@' | '+' | '='));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
