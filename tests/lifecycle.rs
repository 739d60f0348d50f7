// tests/lifecycle.rs

use std::time::Duration;

use nodejob::exec::ExecutionResult;
use nodejob::job::{JobId, JobRequest};
use nodejob::supervisor::{LogsOutcome, StatusOutcome};
use nodejob::types::RunningState;
use nodejob_test_utils::builders::{fake_supervisor, SettingsBuilder};
use nodejob_test_utils::{init_tracing, with_timeout};

fn id(raw: &str) -> JobId {
    JobId::recognize("nodejob-", raw).unwrap()
}

#[tokio::test]
async fn list_only_reports_namespaced_containers() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.add_foreign("postgres");
    engine.add_foreign("nodejobber");

    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");
    assert!(with_timeout(supervisor.execute(&request)).await.succeeded);

    let records = with_timeout(supervisor.list()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier.as_str(), "nodejob-web");
    assert_eq!(records[0].running_state, RunningState::Running);

    // Foreign containers must never be inspected.
    let inspects = engine.calls_of("inspect");
    assert_eq!(inspects, vec![vec!["inspect", "--type", "container", "nodejob-web"]]);
}

#[tokio::test]
async fn empty_list_skips_inspect() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.add_foreign("redis");

    let records = with_timeout(supervisor.list()).await.unwrap();

    assert!(records.is_empty());
    assert!(engine.calls_of("inspect").is_empty());
}

#[tokio::test]
async fn list_surfaces_engine_failure() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.script_next(ExecutionResult::exited(
        1,
        "",
        "Cannot connect to the Docker daemon",
    ));

    let err = with_timeout(supervisor.list()).await.unwrap_err();
    assert!(err.to_string().contains("Cannot connect"));
}

#[tokio::test]
async fn list_tolerates_job_removed_between_ps_and_inspect() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");
    with_timeout(supervisor.execute(&request)).await;

    // `ps` still reports `nodejob-gone`; by the time of `inspect` it is gone.
    engine.script_next(ExecutionResult::exited(0, "nodejob-gone\nnodejob-web\n", ""));

    let records = with_timeout(supervisor.list()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier.as_str(), "nodejob-web");
    let inspect = engine.calls_of("inspect").pop().unwrap();
    assert!(inspect.contains(&"nodejob-gone".to_string()));
}

#[tokio::test]
async fn running_install_is_not_listed_as_a_job() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.set_ephemeral_delay(Duration::from_millis(300));

    let installer = supervisor.clone();
    let install =
        tokio::spawn(async move { installer.execute(&JobRequest::install("/work/app")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.container_names().len(), 1);
    let records = with_timeout(supervisor.list()).await.unwrap();
    assert!(records.is_empty(), "{records:?}");

    assert!(with_timeout(install).await.unwrap().succeeded);
    assert!(engine.container_names().is_empty());
}

#[tokio::test]
async fn same_named_volume_does_not_turn_absent_job_into_error() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let volume = r#"[{"CreatedAt": "2026-10-18T10:00:00Z", "Driver": "local", "Labels": null,
        "Mountpoint": "/var/lib/docker/volumes/nodejob-web/_data", "Name": "nodejob-web",
        "Options": null, "Scope": "local"}]"#;

    engine.script_next(ExecutionResult::exited(0, volume, ""));
    assert_eq!(
        with_timeout(supervisor.status(&id("web"))).await,
        StatusOutcome::NotFound(id("web"))
    );

    engine.script_next(ExecutionResult::exited(0, volume, ""));
    let stopped = with_timeout(supervisor.stop(&id("web"))).await;
    assert!(stopped.is_not_found(), "{stopped:?}");
    assert!(engine.calls_of("rm").is_empty());

    for call in engine.calls_of("inspect") {
        assert_eq!(&call[..3], ["inspect", "--type", "container"]);
    }
}

#[tokio::test]
async fn status_reports_uptime_for_running_job_only() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");
    with_timeout(supervisor.execute(&request)).await;

    match with_timeout(supervisor.status(&id("web"))).await {
        StatusOutcome::Found { record, uptime } => {
            assert_eq!(record.running_state, RunningState::Running);
            assert!(record.started_at.is_some());
            assert!(uptime.is_some());
        }
        other => panic!("expected Found, got {other:?}"),
    }

    engine.exit_container("nodejob-web");

    match with_timeout(supervisor.status(&id("nodejob-web"))).await {
        StatusOutcome::Found { record, uptime } => {
            assert_eq!(record.running_state, RunningState::Exited);
            assert!(uptime.is_none());
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[tokio::test]
async fn status_of_unknown_job_is_not_found() {
    init_tracing();
    let (supervisor, _engine) = fake_supervisor(SettingsBuilder::new().build());

    let outcome = with_timeout(supervisor.status(&id("ghost"))).await;
    assert_eq!(outcome, StatusOutcome::NotFound(id("ghost")));
}

#[tokio::test]
async fn stop_is_idempotent() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");
    with_timeout(supervisor.execute(&request)).await;

    let first = with_timeout(supervisor.stop(&id("web"))).await;
    assert!(first.removed);
    assert!(engine.container("nodejob-web").is_none());

    let second = with_timeout(supervisor.stop(&id("web"))).await;
    assert!(!second.removed);
    assert!(second.is_not_found());

    assert!(matches!(
        with_timeout(supervisor.status(&id("web"))).await,
        StatusOutcome::NotFound(_)
    ));
}

#[tokio::test]
async fn stop_never_touches_foreign_container() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    engine.add_foreign("postgres");

    let outcome = with_timeout(supervisor.stop(&id("postgres"))).await;

    assert!(outcome.is_not_found());
    assert!(engine.container("postgres").is_some());
    assert!(engine.calls_of("rm").is_empty());
}

#[tokio::test]
async fn stop_then_run_with_same_hint_succeeds() {
    init_tracing();
    let (supervisor, _engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");

    assert!(with_timeout(supervisor.execute(&request)).await.succeeded);
    assert!(with_timeout(supervisor.stop(&id("web"))).await.removed);
    assert!(with_timeout(supervisor.execute(&request)).await.succeeded);
}

#[tokio::test]
async fn logs_return_requested_tail() {
    init_tracing();
    let (supervisor, engine) = fake_supervisor(SettingsBuilder::new().build());
    let request = JobRequest::run_persistent("/work/app", "start").with_hint("web");
    with_timeout(supervisor.execute(&request)).await;
    for n in 1..=5 {
        engine.push_log("nodejob-web", &format!("line {n}"));
    }

    match with_timeout(supervisor.logs(&id("web"), 2)).await {
        LogsOutcome::Found { identifier, output } => {
            assert_eq!(identifier.as_str(), "nodejob-web");
            assert_eq!(output, "line 4\nline 5");
        }
        other => panic!("expected Found, got {other:?}"),
    }

    assert!(matches!(
        with_timeout(supervisor.logs(&id("ghost"), 10)).await,
        LogsOutcome::NotFound(_)
    ));
}
