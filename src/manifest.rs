// src/manifest.rs

//! Project manifest (`package.json`) script table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{NodejobError, Result};
use crate::fs::FileSystem;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: Option<BTreeMap<String, String>>,
}

/// Read the `scripts` table of the project's manifest.
///
/// An absent or empty table yields an empty map; a missing or malformed
/// manifest is a [`NodejobError::ManifestError`].
pub fn read_scripts(fs: &dyn FileSystem, project_path: &Path) -> Result<BTreeMap<String, String>> {
    let path = project_path.join(MANIFEST_FILE);
    let manifest_error = |reason: String| NodejobError::ManifestError {
        path: path.clone(),
        reason,
    };

    if !fs.is_file(&path) {
        return Err(manifest_error("file not found".to_string()));
    }

    let contents = fs
        .read_to_string(&path)
        .map_err(|e| manifest_error(format!("{e:#}")))?;

    let manifest: PackageJson =
        serde_json::from_str(&contents).map_err(|e| manifest_error(e.to_string()))?;

    Ok(manifest.scripts.unwrap_or_default())
}
