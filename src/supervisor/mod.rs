// src/supervisor/mod.rs

//! Stateless job supervisor over an external container engine.
//!
//! The engine is the single source of truth: nothing about launched jobs is
//! remembered here, every query is a live round trip through the
//! [`EngineBackend`]. That keeps a restart of this process from losing
//! anything and means containers stopped by other tools are never reported
//! stale.
//!
//! - [`dispatch`]: install / run-once / run-persistent execution.
//! - [`inspect`]: list, status and logs queries.
//! - [`teardown`]: idempotent stop-and-remove.
//! - [`record`]: parsing of the engine's introspection output.

pub mod dispatch;
pub mod inspect;
pub mod record;
pub mod teardown;

use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::exec::{EngineBackend, ExecutionResult, InvokeOptions};

pub use dispatch::JobOutcome;
pub use inspect::{LogsOutcome, StatusOutcome};
pub use record::{ManagedContainerRecord, format_uptime};
pub use teardown::StopOutcome;

/// Entry point for every job operation.
///
/// Cheap to clone; clones share the same read-only settings and backend, so
/// concurrent requests need no coordination.
#[derive(Clone)]
pub struct Supervisor {
    settings: Arc<Settings>,
    engine: Arc<dyn EngineBackend>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(settings: Settings, engine: Arc<dyn EngineBackend>) -> Self {
        Self {
            settings: Arc::new(settings),
            engine,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Introspection / teardown call bounded by the control timeout.
    async fn control(&self, args: Vec<String>) -> ExecutionResult {
        self.engine
            .invoke(args, InvokeOptions::bounded(self.settings.control_timeout))
            .await
    }
}
