// src/exec/mod.rs

//! Container engine invocation layer.
//!
//! Everything the supervisor knows about the outside world comes through
//! this module: each call spawns exactly one engine CLI process via
//! `tokio::process::Command` and reports back a uniform [`ExecutionResult`].
//!
//! - [`backend`] provides the `EngineBackend` trait and the result types, so
//!   tests can replace the engine with an in-memory fake.
//! - [`process`] holds `CliEngine`, the production backend that shells out
//!   to the configured engine binary.

pub mod backend;
pub mod process;

pub use backend::{EngineBackend, ExecutionResult, InvokeOptions};
pub use process::CliEngine;
