//! CLI output formatting

use crate::{
    core::{BusinessConfig, Job, JobStatus, JobStep, PipelineResult, StepStatus},
    execution::RunEvent,
    validation::ValidationIssue,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a pipeline runs
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    match status {
        StepStatus::Ok => style("OK").green().to_string(),
        StepStatus::Skipped => style("SKIPPED").dim().to_string(),
        StepStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a job status for display
pub fn format_job_status(status: JobStatus) -> String {
    match status {
        JobStatus::Pending => style("PENDING").dim().to_string(),
        JobStatus::Running => style("RUNNING").yellow().to_string(),
        JobStatus::Completed => style("COMPLETED").green().to_string(),
        JobStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// One line per step
pub fn format_step(index: usize, step: &JobStep) -> String {
    let icon = match step.status {
        StepStatus::Ok => CHECK,
        StepStatus::Skipped => SKIP,
        StepStatus::Failed => CROSS,
    };
    let mut line = format!(
        "{} [{}] {} {}",
        icon,
        index + 1,
        style(&step.name).cyan(),
        format_step_status(step.status)
    );
    if step.critical {
        line.push_str(&format!(" {}", style("(critical)").dim()));
    }
    if let Some(error) = &step.error {
        line.push_str(&format!(": {}", style(error).red()));
    } else if let Some(message) = step.details.get("message").and_then(|m| m.as_str()) {
        line.push_str(&format!(": {}", style(message).dim()));
    }
    line
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::Started {
            job_id,
            business_id,
            pipeline_key,
            total_actions,
        } => format!(
            "{} Running {} for {} ({} action(s), job {})",
            ROCKET,
            style(pipeline_key).bold(),
            style(business_id).cyan(),
            total_actions,
            style(short_id(job_id)).dim()
        ),
        RunEvent::StepFinished { index, step, .. } => format_step(*index, step),
        RunEvent::Finished { job_id, status } => format!(
            "{} Job {} {}",
            INFO,
            style(short_id(job_id)).dim(),
            format_job_status(*status)
        ),
    }
}

/// Final verdict of a run
pub fn format_result(result: &PipelineResult) -> String {
    let failed_ok = result.non_critical_failures().count();
    if result.success {
        let mut line = format!(
            "{} {} completed {}",
            CHECK,
            style(&result.pipeline_key).bold(),
            style("successfully").green()
        );
        if failed_ok > 0 {
            line.push_str(&format!(
                " ({} non-critical step(s) {})",
                failed_ok,
                style("failed").yellow()
            ));
        }
        if result.dry_run {
            line.push_str(&format!(" {}", style("[dry run]").dim()));
        }
        line
    } else {
        format!(
            "{} {} {}: {}",
            CROSS,
            style(&result.pipeline_key).bold(),
            style("failed").red(),
            result.error.as_deref().unwrap_or("unknown error")
        )
    }
}

/// One-line job summary for history listings
pub fn format_job_summary(job: &Job) -> String {
    let status_icon = match job.status {
        JobStatus::Completed => CHECK,
        JobStatus::Failed => CROSS,
        JobStatus::Running => SPINNER,
        JobStatus::Pending => INFO,
    };

    format!(
        "{} {} - {} - {} - {} ok, {} skipped, {} failed - {}",
        status_icon,
        style(short_id(&job.id)).dim(),
        style(&job.pipeline_key).bold(),
        format_job_status(job.status),
        job.count_steps(StepStatus::Ok),
        job.count_steps(StepStatus::Skipped),
        job.count_steps(StepStatus::Failed),
        style(job.created_at.format("%Y-%m-%d %H:%M:%S")).dim()
    )
}

/// Business listing line
pub fn format_business(business: &BusinessConfig) -> String {
    let name = if business.display_name.is_empty() {
        String::new()
    } else {
        format!(" ({})", business.display_name)
    };
    format!(
        "  {}{} - default form: {}, {} trigger(s)",
        style(&business.id).bold(),
        name,
        style(business.default_form_pipeline().unwrap_or("none")).cyan(),
        business.pipelines.triggers.len()
    )
}

pub fn format_issue(issue: &ValidationIssue) -> String {
    format!("  {} {}: {}", WARN, style(&issue.subject).bold(), issue.message)
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
