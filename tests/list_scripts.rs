// tests/list_scripts.rs

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use nodejob::errors::NodejobError;
use nodejob::fs::RealFileSystem;
use nodejob::manifest::read_scripts;
use nodejob::server::ToolHandler;
use nodejob_test_utils::builders::{fake_supervisor, SettingsBuilder};
use nodejob_test_utils::init_tracing;

fn project(manifest: Option<&str>) -> TempDir {
    let dir = TempDir::new().unwrap();
    if let Some(contents) = manifest {
        fs::write(dir.path().join("package.json"), contents).unwrap();
    }
    dir
}

fn handler() -> ToolHandler {
    let (supervisor, _engine) = fake_supervisor(SettingsBuilder::new().build());
    ToolHandler::new(supervisor, std::sync::Arc::new(RealFileSystem))
}

#[test]
fn reads_scripts_from_disk_in_name_order() {
    let dir = project(Some(
        r#"{"name": "demo", "scripts": {"test": "jest", "build": "tsc", "start": "node ."}}"#,
    ));

    let scripts = read_scripts(&RealFileSystem, dir.path()).unwrap();
    let names: Vec<&str> = scripts.keys().map(String::as_str).collect();
    assert_eq!(names, ["build", "start", "test"]);
    assert_eq!(scripts["start"], "node .");
}

#[test]
fn missing_manifest_is_a_manifest_error() {
    let dir = project(None);
    match read_scripts(&RealFileSystem, dir.path()) {
        Err(NodejobError::ManifestError { path, .. }) => {
            assert_eq!(path, dir.path().join("package.json"));
        }
        other => panic!("expected ManifestError, got {other:?}"),
    }
}

#[test]
fn malformed_manifest_is_a_manifest_error() {
    let dir = project(Some("{ \"scripts\": "));
    assert!(matches!(
        read_scripts(&RealFileSystem, dir.path()),
        Err(NodejobError::ManifestError { .. })
    ));
}

#[tokio::test]
async fn tool_reports_empty_and_absent_tables_without_error() {
    init_tracing();
    let handler = handler();

    for manifest in [r#"{"name": "a"}"#, r#"{"scripts": {}}"#, r#"{"scripts": null}"#] {
        let dir = project(Some(manifest));
        let reply = handler
            .call(
                "list-scripts",
                json!({"projectPath": dir.path().display().to_string()}),
            )
            .await;
        assert!(!reply.is_error, "{}", reply.text);
        assert!(reply.text.starts_with("No scripts found in"), "{}", reply.text);
    }
}

#[tokio::test]
async fn tool_reports_unreadable_manifest_as_error() {
    init_tracing();
    let handler = handler();
    let dir = project(Some("not json"));

    let reply = handler
        .call(
            "list-scripts",
            json!({"projectPath": dir.path().display().to_string()}),
        )
        .await;

    assert!(reply.is_error);
    assert!(reply.text.contains("package.json"), "{}", reply.text);
}
