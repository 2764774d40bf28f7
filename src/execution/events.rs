//! Execution events and their subscribers

use crate::core::ExecutionStatus;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Events that can occur during a pipeline or publish run
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        step: String,
        attempt: usize,
    },
    StepRetrying {
        step: String,
        attempt: usize,
        max_attempts: usize,
    },
    /// Captured output of a successful attempt
    StepOutput {
        step: String,
        output: String,
    },
    StepUnchanged {
        step: String,
    },
    StepSkipped {
        step: String,
    },
    StepDeclined {
        step: String,
    },
    StepCompleted {
        step: String,
        attempts: usize,
    },
    StepFailed {
        step: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
    ComponentStarted {
        component: String,
        index: usize,
        total: usize,
    },
    ComponentUnchanged {
        component: String,
    },
    ComponentPublished {
        component: String,
    },
    ComponentFailed {
        component: String,
        error: String,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Shared list of event subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub async fn subscribe<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub async fn emit(&self, event: ExecutionEvent) {
        let handlers = self.handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }
}
