//! CLI output formatting

use crate::{
    core::{ExecutionStatus, PipelineFile, RunSummary},
    execution::ExecutionEvent,
    publish::PublishSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    if let Ok(template) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(template.progress_chars("#>-"));
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// Format a pipeline run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Cancelled => WARN,
        ExecutionStatus::Running => SPINNER,
        ExecutionStatus::Pending => INFO,
    };

    let mut line = format!(
        "{} {} - {} - {} executed, {} unchanged, {} skipped ({}/{})",
        status_icon,
        style(&summary.name).bold(),
        format_status(summary.status),
        style(summary.executed).cyan(),
        style(summary.unchanged).dim(),
        style(summary.skipped).dim(),
        summary.completed(),
        summary.total
    );

    if let (Some(started), Some(completed)) = (summary.started_at, summary.completed_at) {
        if let Ok(duration) = completed.signed_duration_since(started).to_std() {
            line.push_str(&format!(" in {}", style(format_duration(duration)).dim()));
        }
    }
    line
}

/// Format a publish summary for display
pub fn format_publish_summary(repo: &str, summary: &PublishSummary) -> String {
    format!(
        "{} {} - {} published, {} unchanged ({} components)",
        CHECK,
        style(repo).bold(),
        style(summary.published).green(),
        style(summary.unchanged).dim(),
        summary.total
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting {} with {} steps ({})",
            ROCKET,
            style(pipeline_name).bold(),
            total_steps,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { step, attempt } => {
            if *attempt > 1 {
                format!("{} {} (attempt {})", SPINNER, style(step).cyan(), style(attempt).dim())
            } else {
                format!("{} {}", SPINNER, style(step).cyan())
            }
        }
        ExecutionEvent::StepRetrying {
            step,
            attempt,
            max_attempts,
        } => format!("{} {} retrying ({}/{})", WARN, style(step).yellow(), attempt, max_attempts),
        ExecutionEvent::StepOutput { step, output } => {
            format!("{} Output from {}:\n{}", INFO, style(step).dim(), format_output(output, 10))
        }
        ExecutionEvent::StepUnchanged { step } => {
            format!("{} {} {}", CHECK, style(step).dim(), style("(unchanged)").dim())
        }
        ExecutionEvent::StepSkipped { step } => format!("{} {} {}", SKIP, style(step).dim(), style("(skipped)").dim()),
        ExecutionEvent::StepDeclined { step } => format!("{} {} declined", WARN, style(step).yellow()),
        ExecutionEvent::StepCompleted { step, .. } => format!("{} {}", CHECK, style(step).green()),
        ExecutionEvent::StepFailed { step, error } => {
            format!("{} {}: {}", CROSS, style(step).red(), style(error).dim())
        }
        ExecutionEvent::PipelineCompleted { execution_id, status } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
        ExecutionEvent::ComponentStarted { component, index, total } => {
            format!("{} [{}/{}] {}", SPINNER, index + 1, total, style(component).cyan())
        }
        ExecutionEvent::ComponentUnchanged { component } => {
            format!("{} {} {}", CHECK, style(component).dim(), style("(unchanged)").dim())
        }
        ExecutionEvent::ComponentPublished { component } => format!("{} {}", CHECK, style(component).green()),
        ExecutionEvent::ComponentFailed { component, error } => {
            format!("{} {}: {}", CROSS, style(component).red(), style(error).dim())
        }
    }
}

/// Format a merged pipeline as a table of steps
pub fn format_pipeline(pipeline: &PipelineFile) -> String {
    let mut lines = vec![format!(
        "{} {} ({})",
        INFO,
        style(&pipeline.metadata.name).bold(),
        style(pipeline.metadata.path.display()).dim()
    )];

    for (index, step) in pipeline.steps.iter().enumerate() {
        let command = if step.command.is_empty() {
            style("<callback>".to_string()).dim().to_string()
        } else {
            format!("{} {}", step.command, step.args.join(" "))
        };
        let sha = if step.sha.is_empty() {
            style("never run".to_string()).yellow().to_string()
        } else {
            style(step.sha.chars().take(12).collect::<String>()).dim().to_string()
        };

        lines.push(format!(
            "  {}. {} - {} [{}]",
            index + 1,
            style(&step.name).cyan(),
            command.trim_end(),
            sha
        ));
    }
    lines.join("\n")
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.trim_end().to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
