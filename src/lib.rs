//! shipyard - incremental deploy and publish pipelines for Kubernetes application bundles

pub mod cli;
pub mod core;
pub mod execution;
pub mod flows;
pub mod publish;

// Re-export commonly used types
pub use crate::core::{EngineConfig, EngineError, ExecutionStatus, Pipeline, PipelineStore, RunSummary, Step, StepAction};
pub use crate::execution::{Confirmer, ExecutionEngine, ExecutionEvent};
pub use crate::flows::{run_flow, FlowKind};
pub use crate::publish::{ComponentRegistry, Manifest, PublishSummary};
