//! CLI output formatting

use crate::{
    core::status::InstanceStatus,
    execution::{DeployEvent, DeployOutcome},
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

/// Create a spinner for a running instance
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner
}

/// Start ticking a spinner
pub fn start_spinner(spinner: &ProgressBar, message: String) {
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
}

/// Format an instance status for display
pub fn format_status(status: InstanceStatus) -> String {
    let label = status.as_str();
    match status {
        InstanceStatus::Succeeded => style(label).green().to_string(),
        InstanceStatus::Failed | InstanceStatus::Killed => style(label).red().to_string(),
        InstanceStatus::Running | InstanceStatus::Killing => style(label).yellow().to_string(),
        InstanceStatus::Awaiting => style(label).blue().to_string(),
        _ => style(label).dim().to_string(),
    }
}

fn format_outcome(kind: &str, name: &str, outcome: &DeployOutcome) -> String {
    let version = outcome
        .version()
        .number
        .map(|n| format!(" version {}", n))
        .unwrap_or_default();
    let verb = if outcome.is_created() { "created" } else { "upgraded" };
    format!(
        "{} {} {} {}{} ({})",
        CHECK,
        kind,
        style(name).bold(),
        style(verb).green(),
        version,
        style(&outcome.version().id).dim()
    )
}

/// Format a deployment event for display
pub fn format_deploy_event(event: &DeployEvent) -> String {
    match event {
        DeployEvent::ProjectResolved { project_id } => {
            format!("{} Project {}", INFO, style(project_id).dim())
        }
        DeployEvent::JobAliasResolved { alias, job_id } => format!(
            "{} {} → {}",
            INFO,
            style(alias).cyan(),
            style(job_id).dim()
        ),
        DeployEvent::GraphBuilt {
            pipeline_name,
            job_nodes,
            condition_nodes,
        } => format!(
            "{} Graph of {}: {} job nodes, {} condition nodes",
            INFO,
            style(pipeline_name).bold(),
            style(job_nodes).cyan(),
            style(condition_nodes).cyan()
        ),
        DeployEvent::JobDeployed { job_name, outcome } => format_outcome("Job", job_name, outcome),
        DeployEvent::PipelineDeployed {
            pipeline_name,
            outcome,
        } => format_outcome("Pipeline", pipeline_name, outcome),
        DeployEvent::InstanceStarted {
            kind,
            name,
            instance,
        } => format!(
            "{} Started {} {} ({}) {}",
            ROCKET,
            kind,
            style(name).bold(),
            style(&instance.id).dim(),
            format_status(instance.status)
        ),
        DeployEvent::InstanceStatusChanged {
            kind,
            instance_id,
            status,
        } => format!(
            "{} {} instance {} {}",
            SPINNER,
            kind,
            style(instance_id).dim(),
            format_status(*status)
        ),
        DeployEvent::InstanceFinished {
            kind,
            instance_id,
            status,
        } => {
            let icon = if status.is_success() { CHECK } else { CROSS };
            format!(
                "{} {} instance {} finished {}",
                icon,
                kind,
                style(instance_id).dim(),
                format_status(*status)
            )
        }
    }
}
