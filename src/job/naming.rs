// src/job/naming.rs

//! Namespaced container identifiers.
//!
//! Every identifier this system creates or accepts starts with the configured
//! namespace marker. The prefix is the only thing separating managed
//! containers from everything else the engine knows about.

use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;

use crate::errors::{NodejobError, Result};

/// Container name grammar accepted by docker/podman.
static CONTAINER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("container name regex is valid")
});

/// Per-process sequence mixed into generated identifiers.
static ID_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    ID_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// True if `name` is a legal engine container name.
pub fn is_valid_container_name(name: &str) -> bool {
    CONTAINER_NAME_RE.is_match(name)
}

/// Identifier of a managed container. Always carries the namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    /// Namespace a caller-supplied hint. The hint is never used verbatim.
    pub fn from_hint(namespace: &str, hint: &str) -> Result<Self> {
        let name = format!("{namespace}{}", hint.trim());
        if hint.trim().is_empty() || !is_valid_container_name(&name) {
            return Err(NodejobError::InvalidArguments(format!(
                "container name hint '{hint}' may only contain letters, digits, '_', '.' and '-'"
            )));
        }
        Ok(JobId(name))
    }

    /// Fallback identifier for persistent jobs started without a hint.
    ///
    /// Format: `{namespace}{script}-{unix_millis}-{seq:x}`. The sequence makes
    /// identifiers minted by one process distinct even within a millisecond.
    pub fn generate(namespace: &str, script_name: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        JobId(format!(
            "{namespace}{script}-{millis}-{seq:x}",
            script = sanitize_segment(script_name),
            seq = next_seq()
        ))
    }

    /// Accept an identifier supplied to a status/stop/logs query.
    ///
    /// Already-namespaced names are taken as-is; bare names get the prefix,
    /// so a query can never reach an unmanaged container.
    pub fn recognize(namespace: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim().trim_start_matches('/');
        if raw.is_empty() {
            return Err(NodejobError::InvalidArguments(
                "identifier must not be empty".to_string(),
            ));
        }

        let name = if raw.starts_with(namespace) {
            raw.to_string()
        } else {
            format!("{namespace}{raw}")
        };

        if !is_valid_container_name(&name) {
            return Err(NodejobError::InvalidArguments(format!(
                "'{raw}' is not a valid container identifier"
            )));
        }

        Ok(JobId(name))
    }

    /// Wrap an engine-reported name if it belongs to `namespace`.
    ///
    /// Engines report names with a leading `/` in some outputs; that is
    /// stripped first.
    pub fn managed(namespace: &str, engine_name: &str) -> Option<Self> {
        let name = engine_name.trim().trim_start_matches('/');
        if name.starts_with(namespace) && name.len() > namespace.len() {
            Some(JobId(name.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map a script name (e.g. `dev:watch`) onto name-safe characters.
fn sanitize_segment(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}
