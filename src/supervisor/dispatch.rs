// src/supervisor/dispatch.rs

use tracing::{info, warn};

use crate::exec::InvokeOptions;
use crate::job::{JobId, JobRequest, resolve};
use crate::types::JobMode;

use super::Supervisor;
use super::record::reports_missing;

/// Output lines echoed back for ephemeral runs.
const OUTPUT_TAIL_LINES: usize = 40;

/// Caller-facing result of [`Supervisor::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub succeeded: bool,
    /// Set for persistent launches, successful or not.
    pub identifier: Option<JobId>,
    pub message: String,
}

impl JobOutcome {
    fn failed(identifier: Option<JobId>, message: String) -> Self {
        Self {
            succeeded: false,
            identifier,
            message,
        }
    }
}

impl Supervisor {
    /// Run `request` against the engine and normalise the result.
    ///
    /// - `Install` / `RunOnce`: waits for the container to finish, bounded
    ///   by the mode's timeout.
    /// - `RunPersistent`: returns once the engine accepted the detached
    ///   container; the workload's later health is not judged here.
    pub async fn execute(&self, request: &JobRequest) -> JobOutcome {
        let job = match resolve(self.settings(), request) {
            Ok(job) if request.mode.is_ephemeral() => {
                let handle = JobId::generate(&self.settings().namespace, &request.mode.to_string());
                job.with_teardown_handle(handle)
            }
            Ok(job) => job,
            Err(e) => {
                warn!(mode = %request.mode, error = %e, "rejecting job request");
                return JobOutcome::failed(None, format!("Invalid request: {e}"));
            }
        };

        info!(
            mode = %request.mode,
            project = ?request.project_path,
            script = ?request.script_name,
            job = ?job.identifier.as_ref().or(job.teardown_handle.as_ref()).map(JobId::as_str),
            "dispatching job"
        );

        let options = InvokeOptions {
            timeout: job.timeout,
            capture_output: true,
        };
        let result = self.engine.invoke(job.engine_args, options).await;
        let project = request.project_path.display();
        let script = request.script_name.as_deref().unwrap_or_default();

        if !result.succeeded() {
            warn!(
                mode = %request.mode,
                exit_code = ?result.exit_code,
                timed_out = result.timed_out,
                "job invocation failed"
            );
        }
        if result.timed_out {
            if let Some(handle) = &job.teardown_handle {
                self.remove_abandoned(handle).await;
            }
        }

        let mut outcome = match request.mode {
            JobMode::Install if result.succeeded() => JobOutcome {
                succeeded: true,
                identifier: None,
                message: with_output(
                    format!("Dependencies installed successfully in {project}."),
                    &result.stdout,
                ),
            },
            JobMode::Install => JobOutcome::failed(
                None,
                format!(
                    "Failed to install dependencies in {project}: {}",
                    result.failure_reason()
                ),
            ),
            JobMode::RunOnce if result.succeeded() => JobOutcome {
                succeeded: true,
                identifier: None,
                message: with_output(
                    format!("Script '{script}' completed successfully."),
                    &result.stdout,
                ),
            },
            JobMode::RunOnce => JobOutcome::failed(
                None,
                format!("Script '{script}' failed: {}", result.failure_reason()),
            ),
            JobMode::RunPersistent => {
                let id = job.identifier;
                let name = id.as_ref().map(JobId::as_str).unwrap_or_default().to_string();
                if result.succeeded() {
                    info!(job = %name, "persistent job started");
                    JobOutcome {
                        succeeded: true,
                        identifier: id,
                        message: format!(
                            "Started persistent job '{name}' running script '{script}'. \
                             Use job-status with identifier \"{name}\" to check on it."
                        ),
                    }
                } else {
                    JobOutcome::failed(
                        id,
                        format!(
                            "Failed to start persistent job '{name}': {}",
                            result.failure_reason()
                        ),
                    )
                }
            }
        };

        if let Some(note) = ignored_options_note(request) {
            outcome.message.push_str("\n\n");
            outcome.message.push_str(note);
        }
        outcome
    }
}

impl Supervisor {
    /// Killing the engine client leaves the container itself running;
    /// force-remove it by name.
    async fn remove_abandoned(&self, handle: &JobId) {
        let result = self
            .control(vec!["rm".to_string(), "-f".to_string(), handle.to_string()])
            .await;
        if result.succeeded() || reports_missing(&result) {
            info!(container = %handle, "removed timed-out container");
        } else {
            warn!(
                container = %handle,
                reason = %result.failure_reason(),
                "failed to remove timed-out container"
            );
        }
    }
}

/// One-off runs have no container to name or publish.
fn ignored_options_note(request: &JobRequest) -> Option<&'static str> {
    let has_extras = request.container_name_hint.is_some() || request.port_mapping.is_some();
    (request.mode == JobMode::RunOnce && has_extras)
        .then_some("Note: containerNameHint and portMapping only apply with persist=true; they were ignored.")
}

fn with_output(headline: String, stdout: &str) -> String {
    let tail = tail_lines(stdout, OUTPUT_TAIL_LINES);
    if tail.is_empty() {
        headline
    } else {
        format!("{headline}\n\nOutput:\n{tail}")
    }
}

/// Last `n` non-trailing-blank lines of `s`.
pub(crate) fn tail_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\n\n", 2), "b\nc");
        assert_eq!(tail_lines("", 5), "");
        assert_eq!(tail_lines("one", 5), "one");
    }

    #[test]
    fn headline_only_when_no_output() {
        assert_eq!(with_output("done".into(), "  \n"), "done");
        assert_eq!(with_output("done".into(), "x\n"), "done\n\nOutput:\nx");
    }
}
