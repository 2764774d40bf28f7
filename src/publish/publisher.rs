//! Publishing side effects
//!
//! Components never talk to a package repository themselves; they describe
//! what to publish and a `Publisher` carries it out.

use crate::core::{EngineError, Result};
use crate::publish::component::ComponentType;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{debug, info};

/// One publish operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub kind: ComponentType,
    /// Path to publish, or the source ref for tags
    pub source: String,
    pub repo: String,
    /// Type-specific arguments (platform/arch, chart name, tag)
    pub extra: Vec<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a component to a repository
    async fn publish(&self, request: &PublishRequest) -> Result<()>;

    /// Execute an inline manifest command in `dir`
    async fn run(&self, command: &str, args: &[String], dir: &Path) -> Result<()>;
}

/// Shells out to an external publishing client:
/// `<client> push <kind> <source> <repo> [extra...]`
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    client: String,
    verbose: bool,
}

impl CommandPublisher {
    pub fn new(client: impl Into<String>, verbose: bool) -> Self {
        Self {
            client: client.into(),
            verbose,
        }
    }

    async fn invoke(&self, unit: &str, program: &str, args: &[String], dir: Option<&Path>) -> Result<()> {
        debug!("Running {} {}", program, args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        if self.verbose {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let output = command.output().await.map_err(|e| EngineError::TransientExecution {
            unit: unit.to_string(),
            message: format!("Failed to spawn {}: {}", program, e),
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = format!("{} exited with code {}", program, output.status.code().unwrap_or(-1));
        if !stderr.trim().is_empty() {
            message.push('\n');
            message.push_str(stderr.trim());
        }
        Err(EngineError::TransientExecution {
            unit: unit.to_string(),
            message,
        })
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        info!("Publishing {} {} to {}", request.kind, request.source, request.repo);

        let mut args = vec![
            "push".to_string(),
            request.kind.to_string(),
            request.source.clone(),
            request.repo.clone(),
        ];
        args.extend(request.extra.iter().cloned());

        let unit = format!("{} {}", request.kind, request.source);
        self.invoke(&unit, &self.client, &args, None).await
    }

    async fn run(&self, command: &str, args: &[String], dir: &Path) -> Result<()> {
        info!("Running {} {}", command, args.join(" "));
        let unit = format!("run {}", command);
        self.invoke(&unit, command, args, Some(dir)).await
    }
}

/// Records requests instead of publishing; optionally fails on a source
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishRequest>>,
    commands: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any publish whose source ends with `suffix`
    pub fn failing_on(suffix: impl Into<String>) -> Self {
        Self {
            fail_on: Some(suffix.into()),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Inline commands run so far, as command lines
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        if let Some(suffix) = &self.fail_on {
            if request.source.ends_with(suffix.as_str()) {
                return Err(EngineError::TransientExecution {
                    unit: format!("{} {}", request.kind, request.source),
                    message: "repository rejected upload".to_string(),
                });
            }
        }
        if let Ok(mut published) = self.published.lock() {
            published.push(request.clone());
        }
        Ok(())
    }

    async fn run(&self, command: &str, args: &[String], _dir: &Path) -> Result<()> {
        let line = std::iter::once(command.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(line);
        }
        Ok(())
    }
}
