//! Component registry - publishes a manifest's components in order

use crate::core::{EngineConfig, EngineError, Result};
use crate::execution::{EventBus, ExecutionEvent};
use crate::publish::component::PushContext;
use crate::publish::lock::{LockManager, LockService};
use crate::publish::lockfile::Lockfile;
use crate::publish::manifest::Manifest;
use crate::publish::publisher::Publisher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a publish run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSummary {
    pub published: usize,
    pub unchanged: usize,
    pub total: usize,
}

impl PublishSummary {
    pub fn completed(&self) -> usize {
        self.published + self.unchanged
    }
}

pub struct ComponentRegistry {
    config: EngineConfig,
    locks: LockManager,
    publisher: Arc<dyn Publisher>,
    events: EventBus,
}

impl ComponentRegistry {
    pub fn new(config: EngineConfig, locks: Arc<dyn LockService>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            config,
            locks: LockManager::new(locks),
            publisher,
            events: EventBus::new(),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler).await;
    }

    /// Publish every component of `manifest` to its repository.
    ///
    /// The repository lock is released exactly once, also when a component
    /// fails, so progress made before the failure is kept.
    pub async fn publish(&self, manifest: &Manifest) -> Result<PublishSummary> {
        let repo = manifest.repo()?;
        let mut lockfile = self.locks.acquire(repo).await?;

        let result = self.publish_components(manifest, repo, &mut lockfile).await;
        let released = self.locks.release(repo, &lockfile).await;

        match (result, released) {
            (Ok(summary), Ok(())) => {
                info!(
                    "Published {}: {} published, {} unchanged",
                    repo, summary.published, summary.unchanged
                );
                Ok(summary)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                error!("Failed to release lock for {}: {}", repo, release_err);
                Err(e)
            }
        }
    }

    async fn publish_components(&self, manifest: &Manifest, repo: &str, lockfile: &mut Lockfile) -> Result<PublishSummary> {
        let total = manifest.components.len();
        let mut summary = PublishSummary {
            total,
            ..PublishSummary::default()
        };

        let ctx = PushContext {
            repo,
            base_dir: &manifest.base_dir,
            ignore_file: &self.config.ignore_file,
            publisher: self.publisher.as_ref(),
        };

        for (index, component) in manifest.components.iter().enumerate() {
            let label = component.label();
            self.events
                .emit(ExecutionEvent::ComponentStarted {
                    component: label.clone(),
                    index,
                    total,
                })
                .await;

            let kind = component.kind();
            let key = component.key();
            let previous = lockfile.get(kind, &key).map(str::to_string);

            match component.push(&ctx, previous.as_deref()).await {
                Ok(outcome) => {
                    lockfile.set(kind, key, outcome.hash);
                    if outcome.published {
                        summary.published += 1;
                        self.events.emit(ExecutionEvent::ComponentPublished { component: label }).await;
                    } else {
                        summary.unchanged += 1;
                        self.events.emit(ExecutionEvent::ComponentUnchanged { component: label }).await;
                    }
                }
                Err(e) => {
                    error!("Publishing {} failed: {}", label, e);
                    self.events
                        .emit(ExecutionEvent::ComponentFailed {
                            component: label.clone(),
                            error: e.to_string(),
                        })
                        .await;
                    return Err(EngineError::fatal(&label, 1, e.to_string(), summary.completed(), total));
                }
            }
        }

        Ok(summary)
    }
}
