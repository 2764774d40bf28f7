//! Pipeline execution engine

pub mod confirm;
pub mod engine;
pub mod events;
pub mod executor;

pub use confirm::{AutoApprove, AutoDecline, Confirmer, ScriptedConfirmer};
pub use engine::ExecutionEngine;
pub use events::{EventBus, EventHandler, ExecutionEvent};
pub use executor::{ExecutionResult, StepExecutor};
