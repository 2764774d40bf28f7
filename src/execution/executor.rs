//! Step executor - runs a single attempt of a step's action

use crate::core::{Step, StepAction};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Action completed successfully
    Success {
        /// Captured output (empty when streamed or for callbacks)
        output: String,
    },
    /// Action failed; may be retried
    Failed { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }
}

/// Executes a step's action inside its working directory
#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    /// Stream output for every step, regardless of the step's own flag
    verbose: bool,
}

impl StepExecutor {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run one attempt of `step` with paths resolved against `root`
    pub async fn execute(&self, step: &Step, root: &Path) -> ExecutionResult {
        let dir = step.resolved_dir(root);
        info!("Executing step: {}", step.name);

        match &step.action {
            StepAction::Command { program, args } => {
                let stream = self.verbose || step.verbose;
                self.run_command(program, args, &dir, stream).await
            }
            StepAction::Callback(callback) => match callback(&dir) {
                Ok(()) => ExecutionResult::Success { output: String::new() },
                Err(e) => {
                    warn!("Step {} callback failed: {:#}", step.name, e);
                    ExecutionResult::Failed { error: format!("{:#}", e) }
                }
            },
        }
    }

    async fn run_command(&self, program: &str, args: &[String], dir: &Path, stream: bool) -> ExecutionResult {
        debug!("Running {} {} in {}", program, args.join(" "), dir.display());

        let mut command = Command::new(program);
        command.args(args).current_dir(dir).stdin(Stdio::inherit());

        if stream {
            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await;

            return match status {
                Ok(status) if status.success() => ExecutionResult::Success { output: String::new() },
                Ok(status) => ExecutionResult::Failed {
                    error: format!("{} exited with code {}", program, status.code().unwrap_or(-1)),
                },
                Err(e) => ExecutionResult::Failed {
                    error: format!("Failed to spawn {}: {}", program, e),
                },
            };
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                return ExecutionResult::Failed {
                    error: format!("Failed to spawn {}: {}", program, e),
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            debug!("{} returned {} bytes of output", program, stdout.len());
            return ExecutionResult::Success { output: stdout };
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        let mut error = format!("{} exited with code {}", program, exit_code);
        for captured in [stdout.trim(), stderr.trim()] {
            if !captured.is_empty() {
                error.push('\n');
                error.push_str(captured);
            }
        }
        ExecutionResult::Failed { error }
    }
}
