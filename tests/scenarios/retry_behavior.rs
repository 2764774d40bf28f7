//! Test: Retry behavior of failing steps

use crate::helpers::*;
use shipyard::core::{EngineError, ExecutionStatus, Pipeline, Step, StepAction};

/// A step that fails twice with a budget of two retries succeeds and
/// persists its hash
#[tokio::test]
async fn test_retry_then_success_persists_hash() {
    let harness = Harness::new();
    let log = ActionLog::new();
    let events = EventLog::default();
    write_file(harness.root(), "terraform/main.tf", "resource {}");

    let engine = harness.engine();
    events.attach(&engine).await;
    let default = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("apply", log.flaky("apply", 2)).with_target("terraform").with_retries(2));

    let (pipeline, result) = harness.run_on(&engine, default).await;
    let summary = result.unwrap();

    assert_eq!(summary.status, ExecutionStatus::Completed);
    assert_eq!(log.take().len(), 3);
    assert_eq!(events.retries("apply"), 2);
    assert!(!pipeline.steps[0].sha.is_empty());
    assert_eq!(harness.persisted_sha("deploy", "apply"), pipeline.steps[0].sha);
}

/// External commands are retried too
#[tokio::test]
async fn test_command_retried_until_success() {
    let harness = Harness::new();
    let default = Pipeline::new(harness.root(), "deploy").with_step(
        Step::new(
            "init",
            StepAction::command("sh", ["-c", "test -f marker || { touch marker; exit 1; }"]),
        )
        .with_retries(1),
    );

    let (_, result) = harness.run(default).await;
    assert_eq!(result.unwrap().executed, 1);
    assert!(harness.root().join("marker").exists());
}

/// Exhausted retries abort the run; completed steps keep their new hashes,
/// the failing and later steps keep their old ones
#[tokio::test]
async fn test_exhausted_retries_abort_run() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "terraform/main.tf", "v1");
    write_file(harness.root(), "helm/Chart.yaml", "v1");

    let pipeline = |log: &ActionLog, failures: usize| {
        Pipeline::new(harness.root(), "deploy")
            .with_step(Step::new("init", log.action("init")).with_target("terraform"))
            .with_step(
                Step::new("apply", log.flaky("apply", failures))
                    .with_target("terraform")
                    .with_retries(1),
            )
            .with_step(Step::new("bounce", log.action("bounce")).with_target("helm"))
    };

    harness.run(pipeline(&log, 0)).await.1.unwrap();
    let apply_before = harness.persisted_sha("deploy", "apply");
    let bounce_before = harness.persisted_sha("deploy", "bounce");
    log.take();

    write_file(harness.root(), "terraform/main.tf", "v2");
    write_file(harness.root(), "helm/Chart.yaml", "v2");
    let failing = ActionLog::new();
    let (_, result) = harness.run(pipeline(&failing, usize::MAX)).await;

    let err = result.unwrap_err();
    assert!(matches!(err, EngineError::FatalExecution { attempts: 2, .. }));
    let message = err.to_string();
    assert!(message.contains("apply"));
    assert!(message.contains("(1/3 completed)"));

    assert_eq!(failing.take(), vec!["init", "apply", "apply"]);
    assert_ne!(harness.persisted_sha("deploy", "init"), "");
    assert_eq!(harness.persisted_sha("deploy", "apply"), apply_before);
    assert_eq!(harness.persisted_sha("deploy", "bounce"), bounce_before);
}
