use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NodejobError;

/// How a job request maps onto the container engine.
///
/// - `Install`: ephemeral `npm install` inside the base image.
/// - `RunOnce`: ephemeral `npm run <script>`, waited on synchronously.
/// - `RunPersistent`: detached, named container that outlives the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobMode {
    Install,
    RunOnce,
    RunPersistent,
}

impl JobMode {
    /// Ephemeral modes run to completion under a bounded timeout.
    pub fn is_ephemeral(self) -> bool {
        !matches!(self, JobMode::RunPersistent)
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobMode::Install => "install",
            JobMode::RunOnce => "run-once",
            JobMode::RunPersistent => "run-persistent",
        };
        f.write_str(s)
    }
}

/// A `host:container` port publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl FromStr for PortMapping {
    type Err = NodejobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NodejobError::InvalidPortMapping(s.to_string());

        let (host, container) = s.trim().split_once(':').ok_or_else(invalid)?;
        let host: u16 = host.trim().parse().map_err(|_| invalid())?;
        let container: u16 = container.trim().parse().map_err(|_| invalid())?;

        if host == 0 || container == 0 {
            return Err(invalid());
        }

        Ok(PortMapping { host, container })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

/// Running state as reported by the engine's introspection output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningState {
    Running,
    Exited,
    Unknown,
}

impl fmt::Display for RunningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunningState::Running => "running",
            RunningState::Exited => "exited",
            RunningState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
