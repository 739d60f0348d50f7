// src/supervisor/inspect.rs

use chrono::{TimeDelta, Utc};
use tracing::{debug, warn};

use crate::errors::{NodejobError, Result};
use crate::job::JobId;

use super::Supervisor;
use super::dispatch::tail_lines;
use super::record::{ManagedContainerRecord, parse_inspect_output, reports_missing};

/// Result of a single-job status query.
///
/// A missing container is an expected terminal state, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Found {
        record: ManagedContainerRecord,
        uptime: Option<TimeDelta>,
    },
    NotFound(JobId),
    Failed(String),
}

/// Result of a log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogsOutcome {
    Found { identifier: JobId, output: String },
    NotFound(JobId),
    Failed(String),
}

impl Supervisor {
    /// Every container whose name carries the namespace marker.
    ///
    /// Empty (not an error) when nothing matches.
    pub async fn list(&self) -> Result<Vec<ManagedContainerRecord>> {
        let namespace = &self.settings().namespace;

        let ps = self
            .control(vec![
                "ps".to_string(),
                "-a".to_string(),
                "--format".to_string(),
                "{{.Names}}".to_string(),
            ])
            .await;
        if !ps.succeeded() {
            warn!(reason = %ps.failure_reason(), "listing containers failed");
            return Err(NodejobError::EngineFailure(ps.failure_reason()));
        }

        // A container may carry several comma-separated names.
        let mut names: Vec<JobId> = ps
            .stdout
            .lines()
            .flat_map(|line| line.split(','))
            .filter_map(|name| JobId::managed(namespace, name))
            .collect();
        names.sort();
        names.dedup();

        debug!(count = names.len(), "managed containers found");
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let inspect = self.control(inspect_args(&names)).await;

        // A job removed between `ps` and `inspect` makes the engine exit
        // non-zero while still describing the rest.
        if !inspect.succeeded() && !reports_missing(&inspect) {
            warn!(reason = %inspect.failure_reason(), "inspecting managed containers failed");
            return Err(NodejobError::EngineFailure(inspect.failure_reason()));
        }

        let mut records = parse_inspect_output(namespace, &inspect.stdout)?;
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(records)
    }

    /// Live state of one job; uptime is computed against the current clock.
    pub async fn status(&self, id: &JobId) -> StatusOutcome {
        let result = self.control(inspect_args(std::slice::from_ref(id))).await;

        if !result.succeeded() {
            if reports_missing(&result) {
                debug!(job = %id, "job not found");
                return StatusOutcome::NotFound(id.clone());
            }
            warn!(job = %id, reason = %result.failure_reason(), "status query failed");
            return StatusOutcome::Failed(result.failure_reason());
        }

        match parse_inspect_output(&self.settings().namespace, &result.stdout) {
            Ok(records) => match records.into_iter().find(|r| &r.identifier == id) {
                Some(record) => {
                    let uptime = record.uptime(Utc::now());
                    StatusOutcome::Found { record, uptime }
                }
                None => StatusOutcome::NotFound(id.clone()),
            },
            Err(e) => StatusOutcome::Failed(e.to_string()),
        }
    }

    /// Last `tail` lines of a job's combined stdout/stderr.
    pub async fn logs(&self, id: &JobId, tail: usize) -> LogsOutcome {
        match self.status(id).await {
            StatusOutcome::Found { .. } => {}
            StatusOutcome::NotFound(id) => return LogsOutcome::NotFound(id),
            StatusOutcome::Failed(reason) => return LogsOutcome::Failed(reason),
        }

        let result = self
            .control(vec![
                "logs".to_string(),
                "--tail".to_string(),
                tail.to_string(),
                id.to_string(),
            ])
            .await;

        if !result.succeeded() {
            if reports_missing(&result) {
                return LogsOutcome::NotFound(id.clone());
            }
            return LogsOutcome::Failed(result.failure_reason());
        }

        // The engine replays the container's stderr on its own stderr.
        let combined = match (result.stdout.trim_end(), result.stderr.trim_end()) {
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        };

        LogsOutcome::Found {
            identifier: id.clone(),
            output: tail_lines(&combined, tail),
        }
    }
}

/// Restricted to containers: a bare `inspect` also matches images, volumes
/// and networks of the same name.
fn inspect_args(ids: &[JobId]) -> Vec<String> {
    let mut args = vec![
        "inspect".to_string(),
        "--type".to_string(),
        "container".to_string(),
    ];
    args.extend(ids.iter().map(JobId::to_string));
    args
}
