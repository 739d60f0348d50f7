// src/exec/process.rs

//! Production engine backend: one OS process per invocation.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::backend::{EngineBackend, ExecutionResult, InvokeOptions};

/// Runs engine command lines by spawning the configured CLI binary.
///
/// Arguments are passed as discrete tokens; no shell is involved on the
/// host side.
#[derive(Debug, Clone)]
pub struct CliEngine {
    binary: String,
}

impl CliEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl EngineBackend for CliEngine {
    fn invoke(
        &self,
        args: Vec<String>,
        options: InvokeOptions,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>> {
        Box::pin(run_engine(&self.binary, args, options))
    }
}

async fn run_engine(binary: &str, args: Vec<String>, options: InvokeOptions) -> ExecutionResult {
    debug!(
        engine = %binary,
        ?args,
        timeout = ?options.timeout,
        "invoking container engine"
    );

    let mut cmd = Command::new(binary);
    cmd.args(&args).stdin(Stdio::null()).kill_on_drop(true);

    if options.capture_output {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(engine = %binary, error = %e, "failed to spawn container engine");
            return ExecutionResult::launch_failed(e.to_string());
        }
    };

    // Drain both pipes concurrently with `wait` so a chatty engine can't
    // block on a full pipe buffer.
    let stdout_task = child.stdout.take().map(spawn_reader);
    let stderr_task = child.stderr.take().map(spawn_reader);

    let wait_res = match options.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(res) => res,
            Err(_) => {
                warn!(
                    engine = %binary,
                    ?args,
                    timeout = ?limit,
                    "engine invocation timed out; killing process"
                );
                if let Err(e) = child.kill().await {
                    warn!(engine = %binary, error = %e, "failed to kill timed-out engine process");
                }
                abort_reader(stdout_task);
                abort_reader(stderr_task);
                return ExecutionResult::timed_out();
            }
        },
        None => child.wait().await,
    };

    let status = match wait_res {
        Ok(status) => status,
        Err(e) => {
            warn!(engine = %binary, error = %e, "waiting for engine process failed");
            abort_reader(stdout_task);
            abort_reader(stderr_task);
            return ExecutionResult::launch_failed(format!("waiting for engine process: {e}"));
        }
    };

    let stdout = collect_reader(stdout_task).await;
    let stderr = collect_reader(stderr_task).await;

    debug!(
        engine = %binary,
        exit_code = ?status.code(),
        success = status.success(),
        "container engine exited"
    );

    ExecutionResult {
        exit_code: status.code(),
        stdout,
        stderr,
        timed_out: false,
        invocation_error: None,
    }
}

fn spawn_reader<R>(mut stream: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf).await {
            debug!(error = %e, "engine output stream ended with error");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect_reader(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

fn abort_reader(task: Option<JoinHandle<String>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}
