//! Test utility functions for shipyard scenarios

use shipyard::core::merge::merge;
use shipyard::core::{EngineConfig, Pipeline, PipelineFile, PipelineStore, Result, RunSummary, StepAction};
use shipyard::execution::{AutoApprove, Confirmer, ExecutionEngine, ExecutionEvent};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Write `content` to `rel` under `root`, creating parent directories
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Records which step actions ran, in order
#[derive(Clone, Default)]
pub struct ActionLog {
    runs: Arc<Mutex<Vec<String>>>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action that records `name` and succeeds
    pub fn action(&self, name: &str) -> StepAction {
        let runs = self.runs.clone();
        let name = name.to_string();
        StepAction::callback(move |_| {
            runs.lock().unwrap().push(name.clone());
            Ok(())
        })
    }

    /// Action that records `name` and fails its first `failures` attempts
    pub fn flaky(&self, name: &str, failures: usize) -> StepAction {
        let runs = self.runs.clone();
        let name = name.to_string();
        StepAction::callback(move |_| {
            let mut runs = runs.lock().unwrap();
            runs.push(name.clone());
            let attempt = runs.iter().filter(|r| **r == name).count();
            anyhow::ensure!(attempt > failures, "{} attempt {} failed", name, attempt);
            Ok(())
        })
    }

    /// Drain the recorded runs
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.runs.lock().unwrap())
    }
}

/// Collects every event a run emits
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ExecutionEvent>>>,
}

impl EventLog {
    pub async fn attach(&self, engine: &ExecutionEngine) {
        let events = self.events.clone();
        engine.add_event_handler(move |e| events.lock().unwrap().push(e)).await;
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn retries(&self, step: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ExecutionEvent::StepRetrying { step: s, .. } if s == step))
            .count()
    }
}

/// An application directory with its own pipeline store
pub struct Harness {
    pub dir: TempDir,
    pub config: EngineConfig,
    pub store: PipelineStore,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::default();
        let store = PipelineStore::new(config.state_dir_for(dir.path()));
        Self { dir, config, store }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(self.config.clone())
    }

    /// Run `default` the way a fresh process would: load the persisted
    /// pipeline, merge, execute
    pub async fn run(&self, default: Pipeline) -> (Pipeline, Result<RunSummary>) {
        self.run_with(default, Arc::new(AutoApprove)).await
    }

    pub async fn run_with(&self, default: Pipeline, confirmer: Arc<dyn Confirmer>) -> (Pipeline, Result<RunSummary>) {
        let engine = self.engine().with_confirmer(confirmer);
        self.run_on(&engine, default).await
    }

    pub async fn run_on(&self, engine: &ExecutionEngine, default: Pipeline) -> (Pipeline, Result<RunSummary>) {
        let previous = self.store.load(&default.metadata);
        let mut pipeline = merge(&previous, default);
        let result = engine.execute(&mut pipeline, &self.store).await;
        (pipeline, result)
    }

    /// The persisted pipeline document, parsed strictly
    pub fn persisted(&self, name: &str) -> PipelineFile {
        PipelineFile::load(&self.store.path_for(name)).unwrap()
    }

    pub fn persisted_sha(&self, pipeline: &str, step: &str) -> String {
        self.persisted(pipeline)
            .steps
            .iter()
            .find(|s| s.name == step)
            .map(|s| s.sha.clone())
            .unwrap_or_default()
    }
}
