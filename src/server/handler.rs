// src/server/handler.rs

//! Maps tool calls onto supervisor operations and renders text reports.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::errors::{NodejobError, Result};
use crate::fs::FileSystem;
use crate::job::{JobId, JobRequest};
use crate::manifest::{self, MANIFEST_FILE};
use crate::supervisor::{
    LogsOutcome, ManagedContainerRecord, StatusOutcome, Supervisor, format_uptime,
};

use super::tools::{
    IdentifierArgs, LogsArgs, NoArgs, ProjectArgs, RunScriptArgs, Tool, absolute_path,
    optional_port_mapping, parse_args,
};

/// Single textual result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// MCP `tools/call` result payload.
    pub fn to_value(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

/// Dispatches tool calls. Cheap to clone into per-request tasks.
#[derive(Debug, Clone)]
pub struct ToolHandler {
    supervisor: Supervisor,
    fs: Arc<dyn FileSystem>,
}

impl ToolHandler {
    pub fn new(supervisor: Supervisor, fs: Arc<dyn FileSystem>) -> Self {
        Self { supervisor, fs }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Run tool `name`. Every failure, including bad arguments, comes back
    /// as an error reply rather than a protocol error.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolReply {
        let Some(tool) = Tool::from_name(name) else {
            return ToolReply::error(format!("Unknown tool: {name}"));
        };

        info!(tool = name, "handling tool call");
        let reply = match self.dispatch(tool, arguments).await {
            Ok(reply) => reply,
            Err(e) => ToolReply::error(e.to_string()),
        };
        debug!(tool = name, is_error = reply.is_error, "tool call finished");
        reply
    }

    async fn dispatch(&self, tool: Tool, arguments: Value) -> Result<ToolReply> {
        match tool {
            Tool::InstallDependencies => {
                let args: ProjectArgs = parse_args(arguments)?;
                let path = absolute_path(&args.project_path)?;
                self.ensure_project_dir(&path)?;
                Ok(self.run_job(JobRequest::install(path)).await)
            }
            Tool::ListScripts => {
                let args: ProjectArgs = parse_args(arguments)?;
                let path = absolute_path(&args.project_path)?;
                Ok(self.list_scripts(&path))
            }
            Tool::RunScript => {
                let args: RunScriptArgs = parse_args(arguments)?;
                let request = run_script_request(&args)?;
                self.ensure_project_dir(&request.project_path)?;
                Ok(self.run_job(request).await)
            }
            Tool::StopJob => {
                let args: IdentifierArgs = parse_args(arguments)?;
                let id = self.recognize(&args.identifier)?;
                Ok(self.stop_job(&id).await)
            }
            Tool::ListJobs => {
                let _: NoArgs = parse_args(arguments)?;
                Ok(self.list_jobs().await)
            }
            Tool::JobStatus => {
                let args: IdentifierArgs = parse_args(arguments)?;
                let id = self.recognize(&args.identifier)?;
                Ok(self.job_status(&id).await)
            }
            Tool::JobLogs => {
                let args: LogsArgs = parse_args(arguments)?;
                let id = self.recognize(&args.identifier)?;
                Ok(self.job_logs(&id, args.tail.max(1)).await)
            }
        }
    }

    fn recognize(&self, raw: &str) -> Result<JobId> {
        JobId::recognize(&self.supervisor.settings().namespace, raw)
    }

    fn ensure_project_dir(&self, path: &Path) -> Result<()> {
        if self.fs.is_dir(path) {
            Ok(())
        } else {
            Err(NodejobError::InvalidArguments(format!(
                "project directory {} does not exist",
                path.display()
            )))
        }
    }

    async fn run_job(&self, request: JobRequest) -> ToolReply {
        let outcome = self.supervisor.execute(&request).await;
        if outcome.succeeded {
            ToolReply::ok(outcome.message)
        } else {
            ToolReply::error(outcome.message)
        }
    }

    fn list_scripts(&self, project: &Path) -> ToolReply {
        let manifest_path = project.join(MANIFEST_FILE);
        match manifest::read_scripts(self.fs.as_ref(), project) {
            Ok(scripts) if scripts.is_empty() => ToolReply::ok(format!(
                "No scripts found in {}.",
                manifest_path.display()
            )),
            Ok(scripts) => {
                let mut text = format!("Scripts in {}:", manifest_path.display());
                for (name, command) in &scripts {
                    let _ = write!(text, "\n- {name}: {command}");
                }
                ToolReply::ok(text)
            }
            Err(e) => ToolReply::error(e.to_string()),
        }
    }

    async fn stop_job(&self, id: &JobId) -> ToolReply {
        let outcome = self.supervisor.stop(id).await;
        if outcome.removed {
            ToolReply::ok(format!("Job '{id}' stopped and removed."))
        } else if outcome.is_not_found() {
            ToolReply::ok(format!("Job '{id}' not found; nothing to stop."))
        } else {
            ToolReply::error(format!(
                "Failed to stop job '{id}': {}",
                outcome.reason.unwrap_or_default()
            ))
        }
    }

    async fn list_jobs(&self) -> ToolReply {
        match self.supervisor.list().await {
            Ok(records) if records.is_empty() => ToolReply::ok("No managed jobs found."),
            Ok(records) => {
                let now = chrono::Utc::now();
                let mut text = format!("Managed jobs ({}):", records.len());
                for record in &records {
                    let _ = write!(text, "\n- {}", summary_line(record, record.uptime(now)));
                }
                ToolReply::ok(text)
            }
            Err(e) => ToolReply::error(format!("Failed to list jobs: {e}")),
        }
    }

    async fn job_status(&self, id: &JobId) -> ToolReply {
        match self.supervisor.status(id).await {
            StatusOutcome::Found { record, uptime } => {
                let mut text = format!("Job '{}'", record.identifier);
                let _ = write!(text, "\nstate: {}", record.running_state);
                if let Some(started) = record.started_at {
                    let _ = write!(text, "\nstarted: {}", started.to_rfc3339());
                }
                if let Some(uptime) = uptime {
                    let _ = write!(text, "\nuptime: {}", format_uptime(uptime));
                }
                let _ = write!(text, "\nports: {}", ports_text(&record));
                ToolReply::ok(text)
            }
            StatusOutcome::NotFound(id) => ToolReply::ok(format!("Job '{id}' not found.")),
            StatusOutcome::Failed(reason) => {
                ToolReply::error(format!("Failed to query job '{id}': {reason}"))
            }
        }
    }

    async fn job_logs(&self, id: &JobId, tail: usize) -> ToolReply {
        match self.supervisor.logs(id, tail).await {
            LogsOutcome::Found { identifier, output } if output.is_empty() => {
                ToolReply::ok(format!("Job '{identifier}' has produced no output yet."))
            }
            LogsOutcome::Found { identifier, output } => {
                ToolReply::ok(format!("Last output of job '{identifier}':\n{output}"))
            }
            LogsOutcome::NotFound(id) => ToolReply::ok(format!("Job '{id}' not found.")),
            LogsOutcome::Failed(reason) => {
                ToolReply::error(format!("Failed to read logs of job '{id}': {reason}"))
            }
        }
    }
}

fn run_script_request(args: &RunScriptArgs) -> Result<JobRequest> {
    let path = absolute_path(&args.project_path)?;
    let ports = optional_port_mapping(args.port_mapping.as_deref())?;

    // Hint and ports are passed through for one-off runs too, so the
    // dispatcher can tell the caller they had no effect.
    let mut request = if args.persist {
        JobRequest::run_persistent(path, args.script_name.clone())
    } else {
        JobRequest::run_once(path, args.script_name.clone())
    };
    if let Some(hint) = &args.container_name_hint {
        request = request.with_hint(hint.clone());
    }
    if let Some(ports) = ports {
        request = request.with_port_mapping(ports);
    }
    Ok(request)
}

fn ports_text(record: &ManagedContainerRecord) -> String {
    if record.ports.is_empty() {
        "none".to_string()
    } else {
        record.ports.join(", ")
    }
}

fn summary_line(record: &ManagedContainerRecord, uptime: Option<chrono::TimeDelta>) -> String {
    let mut line = format!("{}: {}", record.identifier, record.running_state);
    if let Some(uptime) = uptime {
        let _ = write!(line, ", up {}", format_uptime(uptime));
    }
    if !record.ports.is_empty() {
        let _ = write!(line, ", ports {}", record.ports.join(", "));
    }
    line
}
