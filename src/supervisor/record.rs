// src/supervisor/record.rs

//! Read-only projection of the engine's `inspect` JSON.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{NodejobError, Result};
use crate::exec::ExecutionResult;
use crate::job::{EPHEMERAL_LABEL, JobId};
use crate::types::RunningState;

/// One managed container as the engine currently sees it.
///
/// Recomputed on every query; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedContainerRecord {
    pub identifier: JobId,
    pub running_state: RunningState,
    pub started_at: Option<DateTime<Utc>>,
    /// Published ports as `host->container/proto`, e.g. `3000->3000/tcp`.
    pub ports: Vec<String>,
}

impl ManagedContainerRecord {
    /// Wall-clock time since start, for running containers only.
    pub fn uptime(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match (self.running_state, self.started_at) {
            (RunningState::Running, Some(started)) => Some((now - started).max(TimeDelta::zero())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    name: String,
    state: InspectState,
    #[serde(default)]
    config: Option<ContainerConfig>,
    #[serde(default)]
    network_settings: Option<NetworkSettings>,
    #[serde(default)]
    host_config: Option<HostConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    running: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    started_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
}

impl InspectEntry {
    fn is_ephemeral(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|c| c.labels.as_ref())
            .is_some_and(|labels| labels.contains_key(EPHEMERAL_LABEL))
    }
}

type PortTable = HashMap<String, Option<Vec<PortBinding>>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSettings {
    #[serde(default)]
    ports: Option<PortTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostConfig {
    #[serde(default)]
    port_bindings: Option<PortTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PortBinding {
    #[serde(default)]
    host_port: Option<String>,
}

/// Parse `inspect` stdout (a JSON array) into records, keeping only names
/// under `namespace`.
pub fn parse_inspect_output(namespace: &str, stdout: &str) -> Result<Vec<ManagedContainerRecord>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<serde_json::Value> = serde_json::from_str(trimmed)
        .map_err(|e| NodejobError::EngineFailure(format!("unreadable inspect output: {e}")))?;

    Ok(entries
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<InspectEntry>(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                // Not a container (image, volume, network...).
                debug!(error = %e, "skipping inspect entry");
                None
            }
        })
        .filter(|entry| !entry.is_ephemeral())
        .filter_map(|entry| {
            let identifier = JobId::managed(namespace, &entry.name)?;
            Some(ManagedContainerRecord {
                identifier,
                running_state: running_state(&entry.state),
                started_at: entry.state.started_at.as_deref().and_then(parse_started_at),
                ports: published_ports(&entry),
            })
        })
        .collect())
}

/// True if the engine reported the target container as absent.
pub(crate) fn reports_missing(result: &ExecutionResult) -> bool {
    if result.invocation_error.is_some() || result.timed_out || result.exit_code == Some(0) {
        return false;
    }
    let stderr = result.stderr.to_lowercase();
    stderr.contains("no such object")
        || stderr.contains("no such container")
        || stderr.contains("no container with name or id")
}

/// Read straight from the engine's flag and status string.
fn running_state(state: &InspectState) -> RunningState {
    if state.running {
        return RunningState::Running;
    }
    match state.status.as_deref() {
        Some("exited") | Some("dead") | Some("stopped") => RunningState::Exited,
        Some("running") => RunningState::Running,
        _ => RunningState::Unknown,
    }
}

/// Never-started containers report the zero time (`0001-01-01T00:00:00Z`).
fn parse_started_at(s: &str) -> Option<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc);
    if ts.year() <= 1 { None } else { Some(ts) }
}

fn published_ports(entry: &InspectEntry) -> Vec<String> {
    let live = entry
        .network_settings
        .as_ref()
        .and_then(|n| n.ports.as_ref())
        .map(port_strings)
        .unwrap_or_default();

    if !live.is_empty() {
        return live;
    }

    // Stopped containers lose their live bindings; fall back to the
    // requested ones.
    entry
        .host_config
        .as_ref()
        .and_then(|h| h.port_bindings.as_ref())
        .map(port_strings)
        .unwrap_or_default()
}

fn port_strings(table: &PortTable) -> Vec<String> {
    let mut out = BTreeSet::new();
    for (container_port, bindings) in table {
        for binding in bindings.iter().flatten() {
            if let Some(host) = binding.host_port.as_deref().filter(|h| !h.is_empty()) {
                out.insert(format!("{host}->{container_port}"));
            }
        }
    }
    out.into_iter().collect()
}

/// Compact human-readable duration, e.g. `2d 3h`, `1h 5m`, `42s`.
pub fn format_uptime(delta: TimeDelta) -> String {
    let secs = delta.num_seconds().max(0);
    let (days, hours, mins, secs) = (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60, secs % 60);

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
