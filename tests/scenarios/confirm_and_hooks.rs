//! Test: Confirmation prompts, after-hooks and skip conditions

use crate::helpers::*;
use shipyard::core::{ExecutionStatus, Pipeline, SkipCondition, Step};
use shipyard::execution::{AutoDecline, ExecutionEvent, ScriptedConfirmer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn destroy(harness: &Harness, log: &ActionLog) -> Pipeline {
    Pipeline::new(harness.root(), "destroy")
        .with_step(Step::new("init", log.action("init")).with_target("terraform"))
        .with_step(Step::new("destroy", log.action("destroy")).with_confirm("Destroy everything?"))
        .with_step(Step::new("cleanup", log.action("cleanup")).with_target("terraform"))
}

/// Declining stops the pipeline without an error and leaves later steps alone
#[tokio::test]
async fn test_declined_confirmation() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "terraform/main.tf", "v1");

    let (_, result) = harness.run_with(destroy(&harness, &log), Arc::new(AutoDecline)).await;
    let summary = result.unwrap();

    assert_eq!(summary.status, ExecutionStatus::Cancelled);
    assert_eq!(summary.executed, 1);
    assert_eq!(log.take(), vec!["init"]);
    assert_ne!(harness.persisted_sha("destroy", "init"), "");
    assert_eq!(harness.persisted_sha("destroy", "cleanup"), "");
}

/// Approval is asked again on every run for steps without a target
#[tokio::test]
async fn test_approved_confirmation_runs_step() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "terraform/main.tf", "v1");
    let confirmer = Arc::new(ScriptedConfirmer::new(vec![true, true]));

    harness.run_with(destroy(&harness, &log), confirmer.clone()).await.1.unwrap();
    assert_eq!(log.take(), vec!["init", "destroy", "cleanup"]);

    harness.run_with(destroy(&harness, &log), confirmer.clone()).await.1.unwrap();
    assert_eq!(log.take(), vec!["destroy"]);
    assert_eq!(confirmer.prompts().len(), 2);
}

/// A failing after-hook is logged, not fatal, and only fires when the
/// action actually ran
#[tokio::test]
async fn test_after_hook_policy() {
    let harness = Harness::new();
    let log = ActionLog::new();
    let hooks = Arc::new(AtomicUsize::new(0));
    write_file(harness.root(), "helm/Chart.yaml", "v1");

    let pipeline = |log: &ActionLog| {
        let hooks = hooks.clone();
        Pipeline::new(harness.root(), "deploy")
            .with_step(Step::new("bounce", log.action("bounce")).with_target("helm").on_after(move |step| {
                hooks.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("webhook for {} timed out", step.name)
            }))
            .with_step(Step::new("notify", log.action("notify")))
    };

    let (_, result) = harness.run(pipeline(&log)).await;
    assert_eq!(result.unwrap().status, ExecutionStatus::Completed);
    assert_eq!(log.take(), vec!["bounce", "notify"]);

    harness.run(pipeline(&log)).await.1.unwrap();
    assert_eq!(log.take(), vec!["notify"]);
    assert_eq!(hooks.load(Ordering::SeqCst), 1);
}

/// Skipped steps are neither hashed nor executed; their predicate is
/// evaluated when the step is reached
#[tokio::test]
async fn test_skip_conditions() {
    let harness = Harness::new();
    let log = ActionLog::new();
    let crds_present = Arc::new(AtomicBool::new(false));
    write_file(harness.root(), "crds/cert.yaml", "kind: CRD");

    let flag = crds_present.clone();
    let engine = harness.engine();
    let events = EventLog::default();
    events.attach(&engine).await;

    let default = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("crds", log.action("crds")).with_target("crds").skip_if(SkipCondition::when(
            move || !flag.load(Ordering::SeqCst),
        )))
        .with_step(Step::new("legacy", log.action("legacy")).skip_if(true));

    let (_, result) = harness.run_on(&engine, default).await;
    assert_eq!(result.unwrap().skipped, 2);
    assert!(log.take().is_empty());
    assert_eq!(harness.persisted_sha("deploy", "crds"), "");
    assert!(events
        .events()
        .contains(&ExecutionEvent::StepSkipped { step: "legacy".to_string() }));

    crds_present.store(true, Ordering::SeqCst);
    let flag = crds_present.clone();
    let default = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("crds", log.action("crds")).with_target("crds").skip_if(SkipCondition::when(
            move || !flag.load(Ordering::SeqCst),
        )))
        .with_step(Step::new("legacy", log.action("legacy")).skip_if(true));
    harness.run_on(&engine, default).await.1.unwrap();
    assert_eq!(log.take(), vec!["crds"]);
}
