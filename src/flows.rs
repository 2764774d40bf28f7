//! Built-in pipelines for an application directory
//!
//! An application directory holds `terraform/`, an optional `crds/` and an
//! optional `helm/` chart. Each flow is defined in code; the persisted copy
//! only contributes step order and recorded hashes.

use crate::core::merge::merge;
use crate::core::{EngineError, Pipeline, PipelineStore, Result, RunSummary, SkipCondition, Step, StepAction};
use crate::execution::ExecutionEngine;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Deploy,
    Diff,
    Destroy,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Deploy => "deploy",
            FlowKind::Diff => "diff",
            FlowKind::Destroy => "destroy",
        }
    }

    /// Default pipeline definition for `dir`
    pub fn pipeline(&self, dir: &Path) -> Pipeline {
        match self {
            FlowKind::Deploy => deploy(dir),
            FlowKind::Diff => diff(dir),
            FlowKind::Destroy => destroy(dir),
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deploy" => Ok(FlowKind::Deploy),
            "diff" => Ok(FlowKind::Diff),
            "destroy" => Ok(FlowKind::Destroy),
            other => Err(EngineError::Config(format!("unknown flow '{}'", other))),
        }
    }
}

/// Files terraform writes into its own working directory
const TERRAFORM_GENERATED: [&str; 3] = [".terraform", ".terraform.lock.hcl", "*.tfstate*"];

fn release_name(dir: &Path) -> String {
    dir.canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "app".to_string())
}

fn missing(dir: &Path, child: &str) -> SkipCondition {
    let path: PathBuf = dir.join(child);
    SkipCondition::when(move || !path.exists())
}

fn terraform_init() -> Step {
    Step::new("terraform-init", StepAction::command("terraform", ["init", "-input=false"]))
        .in_dir("terraform")
        .with_target("terraform")
        .ignoring(TERRAFORM_GENERATED)
        .with_retries(2)
}

fn deploy(dir: &Path) -> Pipeline {
    let release = release_name(dir);
    let upgrade = StepAction::command("helm", ["upgrade", "--install", release.as_str(), "helm/"]);

    Pipeline::new(dir, FlowKind::Deploy.as_str())
        .with_step(terraform_init())
        .with_step(
            Step::new(
                "terraform-apply",
                StepAction::command("terraform", ["apply", "-auto-approve", "-input=false"]),
            )
            .in_dir("terraform")
            .with_target("terraform")
            .ignoring(TERRAFORM_GENERATED)
            .with_retries(1)
            .verbose(true),
        )
        .with_step(
            Step::new("crds", StepAction::command("kubectl", ["apply", "-f", "crds/"]))
                .with_target("crds")
                .skip_if(missing(dir, "crds")),
        )
        .with_step(
            Step::new("bounce", upgrade)
                .with_target("helm")
                .with_retries(2)
                .skip_if(missing(dir, "helm"))
                .on_after(move |step| {
                    info!("Release {} rolled out ({})", release, step.sha);
                    Ok(())
                }),
        )
}

fn diff(dir: &Path) -> Pipeline {
    let release = release_name(dir);

    Pipeline::new(dir, FlowKind::Diff.as_str())
        .with_step(terraform_init())
        .with_step(
            Step::new("terraform-plan", StepAction::command("terraform", ["plan", "-input=false"]))
                .in_dir("terraform")
                .verbose(true),
        )
        .with_step(
            Step::new(
                "helm-diff",
                StepAction::command("helm", ["diff", "upgrade", release.as_str(), "helm/"]),
            )
            .verbose(true)
            .skip_if(missing(dir, "helm")),
        )
}

fn destroy(dir: &Path) -> Pipeline {
    Pipeline::new(dir, FlowKind::Destroy.as_str())
        .with_step(terraform_init())
        .with_step(
            Step::new(
                "terraform-destroy",
                StepAction::command("terraform", ["destroy", "-auto-approve", "-input=false"]),
            )
            .in_dir("terraform")
            .verbose(true)
            .with_confirm(format!("Destroy all infrastructure for {}?", dir.display())),
        )
}

/// Load the persisted pipeline for `kind`, merged with the current definition
pub fn plan(kind: FlowKind, dir: &Path, store: &PipelineStore) -> Pipeline {
    let default = kind.pipeline(dir);
    let previous = store.load(&default.metadata);
    merge(&previous, default)
}

/// Load, merge and run a flow against an application directory
pub async fn run_flow(kind: FlowKind, dir: &Path, engine: &ExecutionEngine) -> Result<RunSummary> {
    if !dir.is_dir() {
        return Err(EngineError::NotFound { path: dir.to_path_buf() });
    }

    let store = PipelineStore::new(engine.config().state_dir_for(dir));
    let mut pipeline = plan(kind, dir, &store);
    info!("Running {} for {} ({} steps)", kind, dir.display(), pipeline.steps.len());

    engine.execute(&mut pipeline, &store).await
}
