// src/exec/backend.rs

//! Pluggable engine backend abstraction.
//!
//! The supervisor talks to an `EngineBackend` instead of spawning processes
//! itself. Production code uses [`CliEngine`](super::CliEngine); tests can
//! provide their own implementation that simulates the engine's CLI.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Per-call invocation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Kill the engine process if it runs longer than this.
    pub timeout: Option<Duration>,
    /// Capture stdout/stderr; when false both are discarded.
    pub capture_output: bool,
}

impl InvokeOptions {
    /// Capture output and bound the call by `timeout`.
    pub fn bounded(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            capture_output: true,
        }
    }

    /// Capture output with no time bound.
    pub fn unbounded() -> Self {
        Self {
            timeout: None,
            capture_output: true,
        }
    }
}

/// Uniform record of one engine invocation.
///
/// - `invocation_error` set, `exit_code` absent: the process never started.
/// - `exit_code` present: the process ran and exited with that status.
/// - `timed_out`: the process was killed at the deadline; output is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub invocation_error: Option<String>,
}

impl ExecutionResult {
    /// A process that ran to completion.
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// A process that could not be started at all.
    pub fn launch_failed(reason: impl Into<String>) -> Self {
        Self {
            invocation_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// A process that was killed at its deadline.
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    /// Zero exit, started fine, not killed.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0) && self.invocation_error.is_none() && !self.timed_out
    }

    /// Human-readable reason for a failed invocation.
    ///
    /// Prefers the launch error, then the timeout, then captured stderr.
    pub fn failure_reason(&self) -> String {
        if let Some(err) = &self.invocation_error {
            return format!("failed to launch container engine: {err}");
        }
        if self.timed_out {
            return "timed out; the engine process was terminated".to_string();
        }

        let stderr = self.stderr.trim();
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        if stderr.is_empty() {
            format!("engine exited with status {code}")
        } else {
            format!("engine exited with status {code}: {stderr}")
        }
    }
}

/// Trait abstracting how engine command lines are executed.
///
/// Implementations must never panic or error past this boundary: every
/// outcome, including a failure to spawn, is reported in the returned
/// [`ExecutionResult`]. No retries are performed here.
pub trait EngineBackend: Send + Sync {
    /// Run one engine command line (`args` excludes the binary itself).
    fn invoke(
        &self,
        args: Vec<String>,
        options: InvokeOptions,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>>;
}
