// src/server/tools.rs

//! Tool catalogue: names, descriptions, input schemas and typed arguments.

use std::path::PathBuf;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::errors::{NodejobError, Result};
use crate::types::PortMapping;

/// Default number of log lines returned by `job-logs`.
pub const DEFAULT_LOG_TAIL: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    InstallDependencies,
    ListScripts,
    RunScript,
    StopJob,
    ListJobs,
    JobStatus,
    JobLogs,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::InstallDependencies,
        Tool::ListScripts,
        Tool::RunScript,
        Tool::StopJob,
        Tool::ListJobs,
        Tool::JobStatus,
        Tool::JobLogs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::InstallDependencies => "install-dependencies",
            Tool::ListScripts => "list-scripts",
            Tool::RunScript => "run-script",
            Tool::StopJob => "stop-job",
            Tool::ListJobs => "list-jobs",
            Tool::JobStatus => "job-status",
            Tool::JobLogs => "job-logs",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::InstallDependencies => {
                "Run `npm install` for a Node.js project inside a throwaway container."
            }
            Tool::ListScripts => "List the scripts defined in a project's package.json.",
            Tool::RunScript => {
                "Run an npm script in a container. With persist=true the container keeps \
                 running detached and can be tracked with job-status / stop-job."
            }
            Tool::StopJob => "Stop and remove a persistent job. Safe to call repeatedly.",
            Tool::ListJobs => "List all containers managed by this server.",
            Tool::JobStatus => "Report running state, uptime and ports of a persistent job.",
            Tool::JobLogs => "Show the most recent output of a persistent job.",
        }
    }

    pub fn input_schema(self) -> Value {
        let project_path = json!({
            "type": "string",
            "description": "Absolute path to the Node.js project directory"
        });
        let identifier = json!({
            "type": "string",
            "description": "Job identifier as returned by run-script"
        });

        match self {
            Tool::InstallDependencies | Tool::ListScripts => json!({
                "type": "object",
                "properties": { "projectPath": project_path },
                "required": ["projectPath"],
                "additionalProperties": false
            }),
            Tool::RunScript => json!({
                "type": "object",
                "properties": {
                    "projectPath": project_path,
                    "scriptName": { "type": "string", "description": "Script name from package.json" },
                    "persist": { "type": "boolean", "default": false, "description": "Keep running detached" },
                    "containerNameHint": { "type": "string", "description": "Name for the persistent job" },
                    "portMapping": { "type": "string", "description": "Port publish as host:container, e.g. 3000:3000" }
                },
                "required": ["projectPath", "scriptName"],
                "additionalProperties": false
            }),
            Tool::StopJob | Tool::JobStatus => json!({
                "type": "object",
                "properties": { "identifier": identifier },
                "required": ["identifier"],
                "additionalProperties": false
            }),
            Tool::ListJobs => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            Tool::JobLogs => json!({
                "type": "object",
                "properties": {
                    "identifier": identifier,
                    "tail": { "type": "integer", "minimum": 1, "default": DEFAULT_LOG_TAIL }
                },
                "required": ["identifier"],
                "additionalProperties": false
            }),
        }
    }

    /// Entry for a `tools/list` response.
    pub fn descriptor(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectArgs {
    pub project_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunScriptArgs {
    pub project_path: String,
    pub script_name: String,
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub container_name_hint: Option<String>,
    #[serde(default)]
    pub port_mapping: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentifierArgs {
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogsArgs {
    pub identifier: String,
    #[serde(default = "default_tail")]
    pub tail: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

fn default_tail() -> usize {
    DEFAULT_LOG_TAIL
}

/// Deserialize tool arguments; a missing/null argument object counts as `{}`.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| NodejobError::InvalidArguments(e.to_string()))
}

/// `projectPath` must be an absolute path.
pub fn absolute_path(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw.trim());
    if raw.trim().is_empty() || !path.is_absolute() {
        return Err(NodejobError::InvalidArguments(format!(
            "projectPath must be an absolute path (got '{raw}')"
        )));
    }
    Ok(path)
}

/// Optional `portMapping` in `host:container` form; blank means absent.
pub fn optional_port_mapping(raw: Option<&str>) -> Result<Option<PortMapping>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("rm-rf"), None);
    }

    #[test]
    fn run_script_defaults() {
        let args: RunScriptArgs =
            parse_args(json!({"projectPath": "/p", "scriptName": "dev"})).unwrap();
        assert!(!args.persist);
        assert!(args.container_name_hint.is_none());
        assert!(args.port_mapping.is_none());
    }

    #[test]
    fn missing_required_and_unknown_fields_are_rejected() {
        assert!(parse_args::<RunScriptArgs>(json!({"projectPath": "/p"})).is_err());
        assert!(parse_args::<IdentifierArgs>(json!({"identifier": "x", "force": true})).is_err());
        assert!(parse_args::<NoArgs>(Value::Null).is_ok());
    }

    #[test]
    fn logs_tail_defaults() {
        let args: LogsArgs = parse_args(json!({"identifier": "web"})).unwrap();
        assert_eq!(args.tail, DEFAULT_LOG_TAIL);
    }

    #[test]
    fn validates_paths_and_ports() {
        assert!(absolute_path("/srv/app").is_ok());
        assert!(absolute_path("srv/app").is_err());
        assert!(absolute_path("").is_err());

        assert_eq!(optional_port_mapping(None).unwrap(), None);
        assert_eq!(optional_port_mapping(Some(" ")).unwrap(), None);
        assert!(optional_port_mapping(Some("3000:3000")).unwrap().is_some());
        assert!(optional_port_mapping(Some("nope")).is_err());
    }
}
