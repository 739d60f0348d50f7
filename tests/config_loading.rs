// tests/config_loading.rs

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use nodejob::config::{load_and_validate, load_or_default};
use nodejob::errors::NodejobError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let file = config_file(
        r#"
[engine]
binary = "podman"

[timeouts]
run_once = "2m"
"#,
    );

    let settings = load_and_validate(file.path()).unwrap();

    assert_eq!(settings.engine_binary, "podman");
    assert_eq!(settings.image, "node:20-alpine");
    assert_eq!(settings.namespace, "nodejob-");
    assert_eq!(settings.install_timeout, Duration::from_secs(10));
    assert_eq!(settings.run_once_timeout, Duration::from_secs(120));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = config_file(
        r#"
[engine]
imag = "node:18"
"#,
    );

    match load_and_validate(file.path()) {
        Err(NodejobError::TomlError(msg)) => assert!(msg.to_string().contains("imag")),
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn semantic_errors_are_config_errors() {
    let file = config_file(
        r#"
[timeouts]
install = "1m"
run_once = "30s"
"#,
    );

    match load_and_validate(file.path()) {
        Err(NodejobError::ConfigError(msg)) => assert!(msg.contains("run_once")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn explicit_missing_file_is_an_error() {
    let result = load_or_default(Some(Path::new("/definitely/not/here/Nodejob.toml")));
    assert!(matches!(result, Err(NodejobError::ConfigError(_))));
}

#[test]
fn explicit_file_is_used() {
    let file = config_file(
        r#"
[engine]
namespace = "agent-"
"#,
    );

    let settings = load_or_default(Some(file.path())).unwrap();
    assert_eq!(settings.namespace, "agent-");
}

#[test]
fn oversized_timeout_is_a_config_error() {
    let file = config_file(
        r#"
[timeouts]
run_once = "99999999999999999h"
"#,
    );

    match load_and_validate(file.path()) {
        Err(NodejobError::ConfigError(msg)) => {
            assert!(msg.contains("run_once"), "{msg}");
            assert!(msg.contains("too large"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}
