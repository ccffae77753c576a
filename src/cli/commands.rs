//! CLI command definitions

use crate::execution::{NodeIdMode, WaitOptions};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Package a job
#[derive(Debug, Args, Clone)]
pub struct PackageJobCommand {
    /// Name of the job (config file and source directory name)
    #[arg(long, alias = "job_name")]
    pub job_name: String,
}

/// Create or upgrade a job
#[derive(Debug, Args, Clone)]
pub struct UpdateJobCommand {
    /// Name of the job config file
    #[arg(long, alias = "job_name")]
    pub job_name: String,
}

/// Run a job
#[derive(Debug, Args, Clone)]
pub struct RunJobCommand {
    /// Name of the job config file
    #[arg(long, alias = "job_name")]
    pub job_name: String,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Create or upgrade a graph pipeline
#[derive(Debug, Args, Clone)]
pub struct UpdatePipelineCommand {
    /// Name of the pipeline config file
    #[arg(long, alias = "pipeline_name")]
    pub pipeline_name: String,

    /// Build and print the graph without deploying it
    #[arg(long)]
    pub dry_run: bool,

    /// Derive node ids from the pipeline alias instead of generating new ones
    #[arg(long)]
    pub stable_node_ids: bool,
}

impl UpdatePipelineCommand {
    pub fn node_id_mode(&self) -> NodeIdMode {
        if self.stable_node_ids {
            NodeIdMode::Stable
        } else {
            NodeIdMode::Random
        }
    }
}

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunPipelineCommand {
    /// Name of the pipeline config file
    #[arg(long, alias = "pipeline_name")]
    pub pipeline_name: String,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Validate a pipeline graph definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the JSON or YAML definition file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Options for waiting on a started instance
#[derive(Debug, Args, Clone)]
pub struct WaitArgs {
    /// Wait until the instance finishes and fail when it does not succeed
    #[arg(long)]
    pub wait: bool,

    /// Seconds between two status checks
    #[arg(long, default_value_t = 10)]
    pub poll_interval: u64,

    /// Give up waiting after this many seconds
    #[arg(long)]
    pub wait_timeout: Option<u64>,
}

impl WaitArgs {
    pub fn options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval: Duration::from_secs(self.poll_interval.max(1)),
            timeout: self.wait_timeout.map(Duration::from_secs),
        }
    }
}
