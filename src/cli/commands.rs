//! CLI command definitions

use crate::flows::FlowKind;
use clap::Args;
use std::path::PathBuf;

/// Run a flow against an application directory
#[derive(Debug, Args, Clone)]
pub struct FlowCommand {
    /// Application directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// Publish a manifest
#[derive(Debug, Args, Clone)]
pub struct PublishCommand {
    /// Path to the manifest
    #[arg(short, long, default_value = "shipyard.manifest")]
    pub file: PathBuf,

    /// Directory holding repository lockfiles (overrides config)
    #[arg(long)]
    pub lock_dir: Option<PathBuf>,
}

/// Show a flow's merged pipeline
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Application directory
    pub dir: PathBuf,

    /// Flow to show
    #[arg(value_enum)]
    pub flow: FlowArg,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Flow argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FlowArg {
    Deploy,
    Diff,
    Destroy,
}

impl From<FlowArg> for FlowKind {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Deploy => FlowKind::Deploy,
            FlowArg::Diff => FlowKind::Diff,
            FlowArg::Destroy => FlowKind::Destroy,
        }
    }
}
