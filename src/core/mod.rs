//! Core domain models
//!
//! This module defines the fundamental data structures of the engine:
//! steps, pipelines and their persisted form, content hashing, the
//! order merge, configuration and errors.

pub mod config;
pub mod error;
pub mod hash;
pub mod merge;
pub mod pipeline;
pub mod state;
pub mod step;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use pipeline::*;
pub use state::*;
pub use step::*;
