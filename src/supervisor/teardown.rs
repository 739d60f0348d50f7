// src/supervisor/teardown.rs

use tracing::{info, warn};

use crate::job::JobId;

use super::Supervisor;
use super::inspect::StatusOutcome;
use super::record::reports_missing;

/// Reason reported when the target does not exist.
pub const NOT_FOUND_REASON: &str = "not found";

/// Result of [`Supervisor::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    pub removed: bool,
    pub reason: Option<String>,
}

impl StopOutcome {
    fn not_found() -> Self {
        Self {
            removed: false,
            reason: Some(NOT_FOUND_REASON.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        !self.removed && self.reason.as_deref() == Some(NOT_FOUND_REASON)
    }
}

impl Supervisor {
    /// Force-stop and remove a job. Safe to call repeatedly: a job that is
    /// already gone is reported as not found, not as an error.
    pub async fn stop(&self, id: &JobId) -> StopOutcome {
        match self.status(id).await {
            StatusOutcome::Found { .. } => {}
            StatusOutcome::NotFound(_) => return StopOutcome::not_found(),
            StatusOutcome::Failed(reason) => {
                return StopOutcome {
                    removed: false,
                    reason: Some(reason),
                };
            }
        }

        let result = self
            .control(vec!["rm".to_string(), "-f".to_string(), id.to_string()])
            .await;

        if result.succeeded() {
            info!(job = %id, "job stopped and removed");
            StopOutcome {
                removed: true,
                reason: None,
            }
        } else if reports_missing(&result) {
            // Removed by someone else after the existence check.
            StopOutcome::not_found()
        } else {
            warn!(job = %id, reason = %result.failure_reason(), "failed to remove job");
            StopOutcome {
                removed: false,
                reason: Some(result.failure_reason()),
            }
        }
    }
}
