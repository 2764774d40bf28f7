//! Test: Incremental re-runs only execute steps whose target changed

use crate::helpers::*;
use shipyard::core::hash::hash_path;
use shipyard::core::{ExecutionStatus, Pipeline, Step};

fn two_targets(harness: &Harness, log: &ActionLog) -> Pipeline {
    Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("A", log.action("A")).with_target("dirX"))
        .with_step(Step::new("B", log.action("B")).with_target("dirY"))
}

/// First run executes everything, an unchanged re-run nothing, and an edit
/// re-runs only the step whose target was touched
#[tokio::test]
async fn test_incremental_rerun() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "dirX/f.txt", "v1");
    write_file(harness.root(), "dirY/g.txt", "stable");

    let (_, result) = harness.run(two_targets(&harness, &log)).await;
    assert_eq!(result.unwrap().executed, 2);
    assert_eq!(log.take(), vec!["A", "B"]);
    let h_a = harness.persisted_sha("deploy", "A");
    let h_b = harness.persisted_sha("deploy", "B");
    assert!(!h_a.is_empty());
    assert!(!h_b.is_empty());

    let (_, result) = harness.run(two_targets(&harness, &log)).await;
    let summary = result.unwrap();
    assert_eq!(summary.executed, 0);
    assert_eq!(summary.unchanged, 2);
    assert!(log.take().is_empty());

    write_file(harness.root(), "dirX/f.txt", "v2");
    let (_, result) = harness.run(two_targets(&harness, &log)).await;
    assert_eq!(result.unwrap().status, ExecutionStatus::Completed);
    assert_eq!(log.take(), vec!["A"]);
    assert_ne!(harness.persisted_sha("deploy", "A"), h_a);
    assert_eq!(harness.persisted_sha("deploy", "B"), h_b);
}

/// Files matched by the ignore file never make a step dirty
#[tokio::test]
async fn test_ignored_files_do_not_trigger_rerun() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "dirX/f.txt", "v1");
    write_file(harness.root(), "dirY/g.txt", "stable");
    write_file(harness.root(), ".shipyardignore", "# scratch\n*.log\n.terraform\n");

    harness.run(two_targets(&harness, &log)).await.1.unwrap();
    log.take();

    write_file(harness.root(), "dirX/debug.log", "noise");
    write_file(harness.root(), "dirY/.terraform/providers/lock", "cache");
    harness.run(two_targets(&harness, &log)).await.1.unwrap();
    assert!(log.take().is_empty());

    std::fs::remove_file(harness.root().join("dirY/g.txt")).unwrap();
    harness.run(two_targets(&harness, &log)).await.1.unwrap();
    assert_eq!(log.take(), vec!["B"]);
}

/// Hashing is stable across calls and sensitive to adds, edits and removals
#[tokio::test]
async fn test_hash_stability() {
    let harness = Harness::new();
    write_file(harness.root(), "tree/a.txt", "a");
    write_file(harness.root(), "tree/nested/b.txt", "b");
    let tree = harness.root().join("tree");

    let first = hash_path(&tree, &[]).unwrap();
    assert_eq!(first, hash_path(&tree, &[]).unwrap());

    write_file(harness.root(), "tree/c.txt", "c");
    let added = hash_path(&tree, &[]).unwrap();
    assert_ne!(first, added);

    write_file(harness.root(), "tree/c.txt", "c2");
    let modified = hash_path(&tree, &[]).unwrap();
    assert_ne!(added, modified);

    std::fs::remove_file(tree.join("c.txt")).unwrap();
    assert_eq!(first, hash_path(&tree, &[]).unwrap());
}
