//! Command-line interface

pub mod commands;
pub mod output;
pub mod terminal;

use clap::{Parser, Subcommand};
use commands::{FlowCommand, PublishCommand, ShowCommand};
use std::ffi::OsString;

/// Incremental deploy and publish pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "shipyard")]
#[command(version = "0.1.0")]
#[command(about = "Incremental deploy and publish pipelines for Kubernetes application bundles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging and stream command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to engine configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Provision infrastructure and roll out an application
    Deploy(FlowCommand),

    /// Show what a deploy would change
    Diff(FlowCommand),

    /// Tear down an application's infrastructure
    Destroy(FlowCommand),

    /// Publish the components listed in a manifest
    Publish(PublishCommand),

    /// Show the merged pipeline for a flow without running it
    Show(ShowCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
