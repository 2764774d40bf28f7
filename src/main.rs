use anyhow::{Context, Result};
use shipyard::cli::commands::{FlowCommand, PublishCommand, ShowCommand};
use shipyard::cli::output::*;
use shipyard::cli::terminal::TerminalConfirmer;
use shipyard::cli::{Cli, Command};
use shipyard::core::{EngineConfig, ExecutionStatus, PipelineStore};
use shipyard::execution::{AutoApprove, Confirmer, ExecutionEngine, ExecutionEvent};
use shipyard::flows::{self, FlowKind};
use shipyard::publish::{CommandPublisher, ComponentRegistry, FileLockService, Manifest};
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();
    let config = load_config(&cli)?;

    // Initialize logging
    let log_level = if config.verbose || config.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Deploy(cmd) => run_flow(FlowKind::Deploy, cmd, &cli, config).await?,
        Command::Diff(cmd) => run_flow(FlowKind::Diff, cmd, &cli, config).await?,
        Command::Destroy(cmd) => run_flow(FlowKind::Destroy, cmd, &cli, config).await?,
        Command::Publish(cmd) => publish(cmd, config).await?,
        Command::Show(cmd) => show(cmd, &config)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).with_context(|| format!("Failed to load config from {}", path))?,
        None => EngineConfig::default(),
    };
    if cli.verbose {
        config.verbose = true;
    }
    Ok(config)
}

async fn run_flow(kind: FlowKind, cmd: &FlowCommand, cli: &Cli, config: EngineConfig) -> Result<()> {
    let confirmer: Arc<dyn Confirmer> = if cli.yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(TerminalConfirmer::new())
    };

    let engine = ExecutionEngine::new(config).with_confirmer(confirmer);
    engine
        .add_event_handler(|event| println!("{}", format_execution_event(&event)))
        .await;

    println!("{} {} {}", INFO, style(kind).bold(), style(cmd.dir.display()).dim());

    match flows::run_flow(kind, &cmd.dir, &engine).await {
        Ok(summary) => {
            println!("\n{}", format_run_summary(&summary));
            if summary.status == ExecutionStatus::Cancelled {
                println!("{} {} stopped before completion", WARN, style(kind).bold());
            }
            Ok(())
        }
        Err(e) => {
            println!("\n{} {} {}", CROSS, style(kind).bold(), style("failed").red());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn publish(cmd: &PublishCommand, config: EngineConfig) -> Result<()> {
    let manifest = Manifest::load(&cmd.file).with_context(|| format!("Failed to load manifest {}", cmd.file.display()))?;
    let repo = manifest.repo().context("Manifest has nothing to publish to")?.to_string();

    let lock_dir = cmd.lock_dir.clone().unwrap_or_else(|| config.resolved_lock_dir());
    let publisher = CommandPublisher::new(config.publish_client.clone(), config.verbose);
    let registry = ComponentRegistry::new(config, Arc::new(FileLockService::new(lock_dir)), Arc::new(publisher));

    println!(
        "{} Publishing {} components to {}",
        ROCKET,
        style(manifest.components.len()).cyan(),
        style(&repo).bold()
    );

    let progress = create_progress_bar(manifest.components.len());
    let handler_progress = progress.clone();
    registry
        .add_event_handler(move |event| match &event {
            ExecutionEvent::ComponentStarted { component, .. } => handler_progress.set_message(component.clone()),
            ExecutionEvent::ComponentPublished { .. } | ExecutionEvent::ComponentUnchanged { .. } => {
                handler_progress.println(format_execution_event(&event));
                handler_progress.inc(1);
            }
            ExecutionEvent::ComponentFailed { .. } => handler_progress.println(format_execution_event(&event)),
            _ => {}
        })
        .await;

    let result = registry.publish(&manifest).await;
    progress.finish_and_clear();

    match result {
        Ok(summary) => {
            println!("{}", format_publish_summary(&repo, &summary));
            Ok(())
        }
        Err(e) => {
            println!("{} Publishing to {} {}", CROSS, style(&repo).bold(), style("failed").red());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn show(cmd: &ShowCommand, config: &EngineConfig) -> Result<()> {
    let kind = FlowKind::from(cmd.flow);
    let store = PipelineStore::new(config.state_dir_for(&cmd.dir));
    let pipeline = flows::plan(kind, &cmd.dir, &store).to_file();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&pipeline)?);
    } else {
        println!("{}", format_pipeline(&pipeline));
    }
    Ok(())
}
