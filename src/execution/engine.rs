//! Main execution engine - runs a pipeline's steps in order
//!
//! Every step is hash-gated: when its target's content digest matches the
//! one recorded by the last successful run, the action is not executed.
//! The pipeline is flushed to its store after every step and once more
//! when the run ends, whether it succeeded, failed or was declined.

use crate::{
    core::{
        hash::{hash_path, load_ignore_file},
        EngineConfig, EngineError, ExecutionStatus, Pipeline, PipelineStore, Result, RunSummary, Step,
        StepOutcome,
    },
    execution::{AutoApprove, Confirmer, EventBus, ExecutionEvent, ExecutionResult, StepExecutor},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a single step ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum StepRun {
    Done(StepOutcome),
    Declined,
}

/// Sequential, resumable pipeline runner
pub struct ExecutionEngine {
    executor: StepExecutor,
    config: EngineConfig,
    confirmer: Arc<dyn Confirmer>,
    events: EventBus,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            executor: StepExecutor::new(config.verbose),
            config,
            confirmer: Arc::new(AutoApprove),
            events: EventBus::new(),
        }
    }

    /// Use `confirmer` to answer step confirmation prompts
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler).await;
    }

    /// Execute the entire pipeline, persisting progress to `store`
    pub async fn execute(&self, pipeline: &mut Pipeline, store: &PipelineStore) -> Result<RunSummary> {
        pipeline.validate()?;

        let mut summary = RunSummary::new(pipeline.name());
        let total = pipeline.steps.len();
        summary.start(total);

        info!("Starting pipeline execution: {} ({})", pipeline.name(), summary.execution_id);
        self.events
            .emit(ExecutionEvent::PipelineStarted {
                execution_id: summary.execution_id,
                pipeline_name: pipeline.name().to_string(),
                total_steps: total,
            })
            .await;

        let root = pipeline.root().to_path_buf();
        let ignore = load_ignore_file(&root, &self.config.ignore_file)?;

        for index in 0..total {
            let completed = summary.completed();
            let step = &mut pipeline.steps[index];

            let result = match self.run_step(step, &root, &ignore, completed, total).await {
                Ok(StepRun::Done(outcome)) => {
                    summary.record(&outcome);
                    store.save(pipeline)
                }
                Ok(StepRun::Declined) => {
                    info!("Pipeline {} stopped at {}: confirmation declined", pipeline.name(), pipeline.steps[index].name);
                    return self.finish(pipeline, store, summary, ExecutionStatus::Cancelled).await;
                }
                Err(e) => {
                    if let Err(flush_err) = store.save(pipeline) {
                        error!("Failed to persist pipeline {}: {}", pipeline.name(), flush_err);
                    }
                    Err(e)
                }
            };

            if let Err(e) = result {
                error!("Pipeline {} failed: {}", pipeline.name(), e);
                summary.finish(ExecutionStatus::Failed);
                self.events
                    .emit(ExecutionEvent::PipelineCompleted {
                        execution_id: summary.execution_id,
                        status: ExecutionStatus::Failed,
                    })
                    .await;
                return Err(e);
            }
        }

        self.finish(pipeline, store, summary, ExecutionStatus::Completed).await
    }

    async fn finish(
        &self,
        pipeline: &Pipeline,
        store: &PipelineStore,
        mut summary: RunSummary,
        status: ExecutionStatus,
    ) -> Result<RunSummary> {
        store.save(pipeline)?;
        summary.finish(status);

        info!(
            "Pipeline execution finished: {} - {:?} ({} executed, {} unchanged, {} skipped)",
            pipeline.name(),
            status,
            summary.executed,
            summary.unchanged,
            summary.skipped
        );
        self.events
            .emit(ExecutionEvent::PipelineCompleted {
                execution_id: summary.execution_id,
                status,
            })
            .await;

        Ok(summary)
    }

    /// Execute a single step
    async fn run_step(
        &self,
        step: &mut Step,
        root: &Path,
        ignore: &[String],
        completed: usize,
        total: usize,
    ) -> Result<StepRun> {
        if step.skip.holds() {
            debug!("Skipping step {}", step.name);
            self.events.emit(ExecutionEvent::StepSkipped { step: step.name.clone() }).await;
            return Ok(StepRun::Done(StepOutcome::Skipped));
        }

        let current = self
            .target_hash(step, root, ignore)
            .map_err(|e| EngineError::fatal(&step.name, 0, e.to_string(), completed, total))?;

        if let Some(hash) = &current {
            if !step.is_fresh() && *hash == step.sha {
                debug!("Step {} unchanged ({})", step.name, hash);
                self.events.emit(ExecutionEvent::StepUnchanged { step: step.name.clone() }).await;
                return Ok(StepRun::Done(StepOutcome::Unchanged));
            }
        }

        if let Some(prompt) = &step.confirm {
            if !self.confirmer.confirm(prompt) {
                self.events.emit(ExecutionEvent::StepDeclined { step: step.name.clone() }).await;
                return Ok(StepRun::Declined);
            }
        }

        let max_attempts = step.retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            self.events
                .emit(ExecutionEvent::StepStarted {
                    step: step.name.clone(),
                    attempt,
                })
                .await;
            if attempt > 1 {
                self.events
                    .emit(ExecutionEvent::StepRetrying {
                        step: step.name.clone(),
                        attempt,
                        max_attempts,
                    })
                    .await;
            }

            match self.executor.execute(step, root).await {
                ExecutionResult::Success { output } => {
                    let sha = match current.clone() {
                        Some(hash) => hash,
                        None => self
                            .target_hash(step, root, ignore)
                            .map_err(|e| EngineError::fatal(&step.name, attempt, e.to_string(), completed, total))?
                            .unwrap_or_default(),
                    };
                    step.sha = sha;

                    if !output.is_empty() {
                        self.events
                            .emit(ExecutionEvent::StepOutput {
                                step: step.name.clone(),
                                output,
                            })
                            .await;
                    }
                    self.events
                        .emit(ExecutionEvent::StepCompleted {
                            step: step.name.clone(),
                            attempts: attempt,
                        })
                        .await;

                    if let Some(hook) = step.on_after.clone() {
                        if let Err(e) = hook(step) {
                            warn!("After-hook for step {} failed: {:#}", step.name, e);
                        }
                    }

                    return Ok(StepRun::Done(StepOutcome::Executed { attempts: attempt }));
                }
                ExecutionResult::Failed { error } => {
                    let err = EngineError::TransientExecution {
                        unit: step.name.clone(),
                        message: error.clone(),
                    };
                    warn!("{} (attempt {}/{})", err, attempt, max_attempts);
                    last_error = error;
                }
            }
        }

        self.events
            .emit(ExecutionEvent::StepFailed {
                step: step.name.clone(),
                error: last_error.clone(),
            })
            .await;

        Err(EngineError::fatal(&step.name, max_attempts, last_error, completed, total))
    }

    /// Hash the step's target; `None` when it has no target or the target
    /// does not exist yet
    fn target_hash(&self, step: &Step, root: &Path, ignore: &[String]) -> Result<Option<String>> {
        let Some(target) = step.resolved_target(root) else {
            return Ok(None);
        };

        let ignore: Vec<String> = ignore.iter().chain(&step.ignore).cloned().collect();
        match hash_path(&target, &ignore) {
            Ok(hash) => Ok(Some(hash)),
            Err(e) if e.is_not_found() => {
                debug!("Target {} of step {} does not exist yet", target.display(), step.name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
