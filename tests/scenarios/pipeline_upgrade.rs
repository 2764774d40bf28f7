//! Test: Persisted pipelines across definition changes and corruption

use crate::helpers::*;
use shipyard::core::merge::merged_order;
use shipyard::core::{ExecutionStatus, Pipeline, Step};

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A new step is slotted into the persisted order, a removed one is
/// dropped, and recorded hashes survive for the steps that remain
#[tokio::test]
async fn test_upgraded_definition_keeps_hashes() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "terraform/main.tf", "v1");
    write_file(harness.root(), "helm/Chart.yaml", "v1");

    let v1 = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("init", log.action("init")).with_target("terraform"))
        .with_step(Step::new("apply", log.action("apply")).with_target("terraform"))
        .with_step(Step::new("legacy-hook", log.action("legacy-hook")).with_target("helm"));
    harness.run(v1).await.1.unwrap();
    log.take();

    let v2 = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("init", log.action("init")).with_target("terraform"))
        .with_step(Step::new("migrate", log.action("migrate")).with_target("helm"))
        .with_step(Step::new("apply", log.action("apply")).with_target("terraform"));
    let (pipeline, result) = harness.run(v2).await;

    assert_eq!(result.unwrap().status, ExecutionStatus::Completed);
    assert_eq!(pipeline.step_names(), names(&["init", "migrate", "apply"]));
    assert_eq!(log.take(), vec!["migrate"]);

    let persisted = harness.persisted("deploy");
    assert_eq!(persisted.step_names(), names(&["init", "migrate", "apply"]));
}

/// A corrupt persisted file is replaced by a fresh run
#[tokio::test]
async fn test_corrupt_persisted_file_recovers() {
    let harness = Harness::new();
    let log = ActionLog::new();
    write_file(harness.root(), "terraform/main.tf", "v1");
    let path = harness.store.path_for("deploy");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "metadata: [this is: not, valid").unwrap();

    let default = Pipeline::new(harness.root(), "deploy")
        .with_step(Step::new("init", log.action("init")).with_target("terraform"));
    let (_, result) = harness.run(default).await;

    assert_eq!(result.unwrap().executed, 1);
    assert_eq!(log.take(), vec!["init"]);
    assert_eq!(harness.persisted("deploy").step_names(), names(&["init"]));
}

/// The merge yields exactly the default's names and keeps every adjacent
/// pair of the default in order
#[test]
fn test_merge_totality() {
    let default = names(&["init", "plan", "apply", "crds", "bounce"]);
    let previous_orders = [
        names(&[]),
        names(&["init", "apply", "bounce"]),
        names(&["bounce", "crds", "apply", "plan", "init"]),
        names(&["old", "init", "removed", "crds"]),
        names(&["init", "init", "plan"]),
    ];

    for previous in &previous_orders {
        let merged = merged_order(previous, &default);

        let mut sorted = merged.clone();
        sorted.sort();
        let mut expected = default.clone();
        expected.sort();
        assert_eq!(sorted, expected, "not a permutation for {:?}", previous);

        for pair in default.windows(2) {
            let a = merged.iter().position(|n| *n == pair[0]).unwrap();
            let b = merged.iter().position(|n| *n == pair[1]).unwrap();
            assert!(a < b, "{} must precede {} for {:?}", pair[0], pair[1], previous);
        }
    }
}
