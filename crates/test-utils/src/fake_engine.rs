use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::debug;

use nodejob::exec::{EngineBackend, ExecutionResult, InvokeOptions};

/// A container known to the fake engine.
#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub running: bool,
    pub status: String,
    pub started_at: String,
    /// `(host, container)` port pairs.
    pub ports: Vec<(String, String)>,
    pub labels: BTreeMap<String, String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    containers: BTreeMap<String, FakeContainer>,
    calls: Vec<Vec<String>>,
    scripted: VecDeque<ExecutionResult>,
    ephemeral_delay: Option<Duration>,
    ephemeral_result: Option<ExecutionResult>,
    unavailable: bool,
    anonymous_seq: u64,
}

/// An in-memory stand-in for the docker CLI that:
/// - records every invocation
/// - keeps a table of containers created with `run -d`
/// - answers `ps`, `inspect`, `rm -f` and `logs` from that table.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every argument vector seen so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Invocations whose first argument is `verb`.
    pub fn calls_of(&self, verb: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.first().map(String::as_str) == Some(verb))
            .collect()
    }

    /// Answer the next invocation with `result` regardless of its arguments.
    pub fn script_next(&self, result: ExecutionResult) {
        self.state.lock().unwrap().scripted.push_back(result);
    }

    /// Behave as if the engine binary does not exist.
    pub fn make_unavailable(&self) {
        self.state.lock().unwrap().unavailable = true;
    }

    /// How long ephemeral (`run --rm`) containers take to finish.
    pub fn set_ephemeral_delay(&self, delay: Duration) {
        self.state.lock().unwrap().ephemeral_delay = Some(delay);
    }

    /// Result reported by ephemeral containers (default: exit 0).
    pub fn set_ephemeral_result(&self, result: ExecutionResult) {
        self.state.lock().unwrap().ephemeral_result = Some(result);
    }

    /// Add a running container this system does not own.
    pub fn add_foreign(&self, name: &str) {
        self.insert(name, running_container(Vec::new()));
    }

    pub fn insert(&self, name: &str, container: FakeContainer) {
        self.state
            .lock()
            .unwrap()
            .containers
            .insert(name.to_string(), container);
    }

    /// Simulate the workload exiting on its own.
    pub fn exit_container(&self, name: &str) {
        if let Some(c) = self.state.lock().unwrap().containers.get_mut(name) {
            c.running = false;
            c.status = "exited".to_string();
        }
    }

    pub fn push_log(&self, name: &str, line: &str) {
        if let Some(c) = self.state.lock().unwrap().containers.get_mut(name) {
            c.logs.push(line.to_string());
        }
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.lock().unwrap().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.lock().unwrap().containers.keys().cloned().collect()
    }

    fn handle(&self, args: &[String]) -> ExecutionResult {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());
        debug!(?args, "fake engine call");

        if state.unavailable {
            return ExecutionResult::launch_failed("No such file or directory (os error 2)");
        }
        if let Some(result) = state.scripted.pop_front() {
            return result;
        }

        match args.first().map(String::as_str) {
            Some("run") => run(&mut state, args),
            Some("ps") => ExecutionResult::exited(
                0,
                state
                    .containers
                    .keys()
                    .map(|n| format!("{n}\n"))
                    .collect::<String>(),
                "",
            ),
            Some("inspect") => inspect(&state, &args[1..]),
            Some("rm") => {
                let name = args.last().cloned().unwrap_or_default();
                if state.containers.remove(&name).is_some() {
                    ExecutionResult::exited(0, format!("{name}\n"), "")
                } else {
                    no_such_container(&name)
                }
            }
            Some("logs") => {
                let name = args.last().cloned().unwrap_or_default();
                let tail: usize = args
                    .iter()
                    .position(|a| a == "--tail")
                    .and_then(|i| args.get(i + 1))
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(usize::MAX);
                match state.containers.get(&name) {
                    Some(c) => {
                        let start = c.logs.len().saturating_sub(tail);
                        let out: String = c.logs[start..].iter().map(|l| format!("{l}\n")).collect();
                        ExecutionResult::exited(0, out, "")
                    }
                    None => no_such_container(&name),
                }
            }
            _ => ExecutionResult::exited(1, "", format!("unknown command: {args:?}")),
        }
    }
}

impl EngineBackend for FakeEngine {
    fn invoke(
        &self,
        args: Vec<String>,
        options: InvokeOptions,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>> {
        Box::pin(async move {
            let delay = {
                let mut state = self.state.lock().unwrap();
                let launch = parse_run(&args);
                match (launch, state.ephemeral_delay) {
                    (Some(launch), Some(delay)) if !launch.detached && !state.unavailable => {
                        // The container exists for as long as it runs.
                        if let Some(name) = &launch.name {
                            state.containers.insert(name.clone(), launch.container());
                        }
                        Some(delay)
                    }
                    _ => None,
                }
            };

            if let Some(delay) = delay {
                match options.timeout {
                    Some(limit) if limit < delay => {
                        tokio::time::sleep(limit).await;
                        debug!(?args, "fake engine call timed out; container left running");
                        self.state.lock().unwrap().calls.push(args);
                        return ExecutionResult::timed_out();
                    }
                    _ => tokio::time::sleep(delay).await,
                }
            }

            let mut result = self.handle(&args);
            if !options.capture_output {
                result.stdout.clear();
                result.stderr.clear();
            }
            result
        })
    }
}

/// Flags of a `run` command line that the fake cares about.
struct RunLaunch {
    detached: bool,
    name: Option<String>,
    ports: Vec<(String, String)>,
    labels: BTreeMap<String, String>,
}

impl RunLaunch {
    fn container(&self) -> FakeContainer {
        let mut container = running_container(self.ports.clone());
        container.labels = self.labels.clone();
        container
    }
}

fn parse_run(args: &[String]) -> Option<RunLaunch> {
    if args.first().map(String::as_str) != Some("run") {
        return None;
    }

    let mut launch = RunLaunch {
        detached: false,
        name: None,
        ports: Vec::new(),
        labels: BTreeMap::new(),
    };
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "-d" => launch.detached = true,
            "--rm" => {}
            "--name" => launch.name = rest.next().cloned(),
            "-p" => {
                if let Some((h, c)) = rest.next().and_then(|p| p.split_once(':')) {
                    launch.ports.push((h.to_string(), c.to_string()));
                }
            }
            "--label" => {
                if let Some(label) = rest.next() {
                    let (k, v) = label.split_once('=').unwrap_or((label.as_str(), ""));
                    launch.labels.insert(k.to_string(), v.to_string());
                }
            }
            "-v" | "-w" => {
                rest.next();
            }
            _ => break,
        }
    }
    Some(launch)
}

fn running_container(ports: Vec<(String, String)>) -> FakeContainer {
    FakeContainer {
        running: true,
        status: "running".to_string(),
        started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        ports,
        labels: BTreeMap::new(),
        logs: Vec::new(),
    }
}

fn no_such_container(name: &str) -> ExecutionResult {
    ExecutionResult::exited(
        1,
        "",
        format!("Error response from daemon: No such container: {name}\n"),
    )
}

fn run(state: &mut FakeState, args: &[String]) -> ExecutionResult {
    let Some(launch) = parse_run(args) else {
        return ExecutionResult::exited(125, "", "docker: invalid run command\n");
    };

    if !launch.detached {
        // `--rm`: gone once the command finishes.
        if let Some(name) = &launch.name {
            state.containers.remove(name);
        }
        return state
            .ephemeral_result
            .clone()
            .unwrap_or_else(|| ExecutionResult::exited(0, "done\n", ""));
    }

    let name = launch.name.clone().unwrap_or_else(|| {
        state.anonymous_seq += 1;
        format!("anonymous_{}", state.anonymous_seq)
    });

    if state.containers.contains_key(&name) {
        return ExecutionResult::exited(
            125,
            "",
            format!(
                "docker: Error response from daemon: Conflict. The container name \"/{name}\" is already in use.\n"
            ),
        );
    }

    state.containers.insert(name, launch.container());
    ExecutionResult::exited(0, format!("{:064x}\n", state.containers.len()), "")
}

fn inspect(state: &FakeState, args: &[String]) -> ExecutionResult {
    let mut found = Vec::new();
    let mut missing = Vec::new();

    let mut names = args.iter();
    let mut targets = Vec::new();
    while let Some(arg) = names.next() {
        if arg == "--type" || arg == "--format" {
            names.next();
        } else {
            targets.push(arg);
        }
    }

    for name in targets {
        match state.containers.get(name) {
            Some(c) => found.push(inspect_entry(name, c)),
            None => missing.push(name.clone()),
        }
    }

    let stdout = Value::Array(found).to_string();
    if missing.is_empty() {
        ExecutionResult::exited(0, stdout, "")
    } else {
        let stderr: String = missing
            .iter()
            .map(|n| format!("Error: No such object: {n}\n"))
            .collect();
        ExecutionResult::exited(1, stdout, stderr)
    }
}

fn inspect_entry(name: &str, c: &FakeContainer) -> Value {
    let mut bindings = serde_json::Map::new();
    for (host, container) in &c.ports {
        bindings.insert(
            format!("{container}/tcp"),
            json!([{ "HostIp": "0.0.0.0", "HostPort": host }]),
        );
    }
    let live = if c.running {
        Value::Object(bindings.clone())
    } else {
        json!({})
    };

    json!({
        "Name": format!("/{name}"),
        "State": {
            "Status": c.status,
            "Running": c.running,
            "StartedAt": c.started_at,
        },
        "Config": { "Labels": c.labels },
        "HostConfig": { "PortBindings": Value::Object(bindings) },
        "NetworkSettings": { "Ports": live },
    })
}
