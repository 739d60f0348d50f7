// src/job/mod.rs

//! Job naming and mode resolution.
//!
//! Turns a caller's [`JobRequest`] into the exact engine command line to run,
//! plus (for persistent jobs) the namespaced container identifier the caller
//! uses to track it afterwards.

pub mod naming;
pub mod request;
pub mod resolve;

pub use naming::{JobId, is_valid_container_name};
pub use request::JobRequest;
pub use resolve::{EPHEMERAL_LABEL, ResolvedJob, resolve};
