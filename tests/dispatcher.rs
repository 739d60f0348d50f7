// tests/dispatcher.rs

use std::time::{Duration, Instant};

use nodejob::exec::ExecutionResult;
use nodejob::job::JobRequest;
use nodejob::types::PortMapping;
use nodejob_test_utils::builders::{fake_supervisor, SettingsBuilder};
use nodejob_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn install_runs_npm_install_in_throwaway_container() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());

    let outcome = with_timeout(supervisor.execute(&JobRequest::install("/work/app"))).await;

    assert!(outcome.succeeded, "{}", outcome.message);
    assert!(outcome.identifier.is_none());
    assert!(outcome
        .message
        .starts_with("Dependencies installed successfully in /work/app."));

    let runs = engine.calls_of("run");
    assert_eq!(runs.len(), 1);
    let args = &runs[0];
    assert!(args.contains(&"--rm".to_string()));
    assert!(args.contains(&"/work/app:/app".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("npm install"));
    // Ephemeral jobs leave nothing behind.
    assert!(engine.container_names().is_empty());
}

#[tokio::test]
async fn install_failure_carries_engine_stderr() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.set_ephemeral_result(ExecutionResult::exited(
        1,
        "",
        "npm ERR! code ENOENT\nnpm ERR! missing package.json",
    ));

    let outcome = with_timeout(supervisor.execute(&JobRequest::install("/work/app"))).await;

    assert!(!outcome.succeeded);
    assert!(outcome
        .message
        .starts_with("Failed to install dependencies in /work/app:"));
    assert!(outcome.message.contains("missing package.json"));
}

#[tokio::test]
async fn run_once_quotes_script_name() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());

    let outcome =
        with_timeout(supervisor.execute(&JobRequest::run_once("/work/app", "it's; rm -rf /"))).await;

    assert!(outcome.succeeded, "{}", outcome.message);
    let args = &engine.calls_of("run")[0];
    assert_eq!(
        args.last().map(String::as_str),
        Some(r#"npm run 'it'\''s; rm -rf /'"#)
    );
}

#[tokio::test]
async fn run_once_times_out_within_bound() {
    init_tracing();
    let settings = SettingsBuilder::new()
        .install_timeout("100ms")
        .run_once_timeout("200ms")
        .build();
    let (supervisor, engine) = fake_supervisor(settings);
    engine.set_ephemeral_delay(Duration::from_secs(30));

    let started = Instant::now();
    let outcome = with_timeout(supervisor.execute(&JobRequest::run_once("/work/app", "test"))).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!outcome.succeeded);
    assert!(outcome.message.starts_with("Script 'test' failed:"));
    assert!(outcome.message.contains("timed out"), "{}", outcome.message);
}

#[tokio::test]
async fn timed_out_container_is_force_removed() {
    init_tracing();
    let settings = SettingsBuilder::new()
        .install_timeout("100ms")
        .run_once_timeout("200ms")
        .build();
    let (supervisor, engine) = fake_supervisor(settings);
    engine.set_ephemeral_delay(Duration::from_secs(30));

    let outcome = with_timeout(supervisor.execute(&JobRequest::install("/work/app"))).await;
    assert!(!outcome.succeeded);

    let run = &engine.calls_of("run")[0];
    let name_at = run.iter().position(|a| a == "--name").unwrap();
    let handle = run[name_at + 1].clone();
    assert!(handle.starts_with("nodejob-install-"), "{handle}");
    assert!(run.contains(&"nodejob.ephemeral=true".to_string()));

    assert_eq!(engine.calls_of("rm"), vec![vec!["rm".to_string(), "-f".to_string(), handle]]);
    assert!(engine.container_names().is_empty());
}

#[tokio::test]
async fn run_once_ignores_hint_and_ports() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());

    let request = JobRequest::run_once("/work/app", "build")
        .with_hint("web")
        .with_port_mapping(PortMapping {
            host: 8080,
            container: 80,
        });
    let outcome = with_timeout(supervisor.execute(&request)).await;

    assert!(outcome.succeeded);
    assert!(outcome.message.contains("they were ignored"), "{}", outcome.message);
    let args = &engine.calls_of("run")[0];
    assert!(!args.contains(&"-p".to_string()));
    assert!(!args.contains(&"nodejob-web".to_string()));
    assert!(!args.contains(&"-d".to_string()));
}

#[tokio::test]
async fn persistent_run_uses_namespaced_hint_and_ports() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());

    let request = JobRequest::run_persistent("/work/app", "start")
        .with_hint("web")
        .with_port_mapping(PortMapping {
            host: 3000,
            container: 3000,
        });
    let outcome = with_timeout(supervisor.execute(&request)).await;

    assert!(outcome.succeeded, "{}", outcome.message);
    let id = outcome.identifier.expect("persistent runs report an identifier");
    assert_eq!(id.as_str(), "nodejob-web");
    assert!(outcome.message.contains("job-status"));

    let args = &engine.calls_of("run")[0];
    assert!(args.contains(&"-d".to_string()));
    assert!(args.windows(2).any(|w| w == ["-p", "3000:3000"]));

    let container = engine.container("nodejob-web").expect("container created");
    assert!(container.running);
}

#[tokio::test]
async fn persistent_run_without_hint_gets_fresh_identifier() {
    init_tracing();
    let (supervisor, _engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "dev");

    let first = with_timeout(supervisor.execute(&request)).await;
    let second = with_timeout(supervisor.execute(&request)).await;

    let a = first.identifier.unwrap();
    let b = second.identifier.unwrap();
    assert!(a.as_str().starts_with("nodejob-dev-"));
    assert_ne!(a, b);
    assert!(first.succeeded && second.succeeded);
}

#[tokio::test]
async fn duplicate_hint_reports_engine_conflict() {
    init_tracing();
    let (supervisor, _engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("api");

    assert!(with_timeout(supervisor.execute(&request)).await.succeeded);
    let again = with_timeout(supervisor.execute(&request)).await;

    assert!(!again.succeeded);
    assert_eq!(again.identifier.unwrap().as_str(), "nodejob-api");
    assert!(again.message.contains("already in use"), "{}", again.message);
}

#[tokio::test]
async fn invalid_hint_is_rejected_before_engine_call() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("bad name!");

    let outcome = with_timeout(supervisor.execute(&request)).await;

    assert!(!outcome.succeeded);
    assert!(outcome.message.starts_with("Invalid request:"));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn unavailable_engine_is_a_failed_outcome() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.make_unavailable();

    let outcome = with_timeout(supervisor.execute(&JobRequest::install("/work/app"))).await;

    assert!(!outcome.succeeded);
    assert!(outcome.message.contains("No such file or directory"));
}
