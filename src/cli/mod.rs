//! Command-line interface

pub mod commands;
pub mod output;
pub mod validate;

use crate::platform::{client::DEFAULT_TIMEOUT_SECS, PlatformConfig};
use clap::{Args, Parser, Subcommand};
use commands::{
    PackageJobCommand, RunJobCommand, RunPipelineCommand, UpdateJobCommand,
    UpdatePipelineCommand, ValidateCommand,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Continuous integration for Saagie jobs and pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "saagie-ci")]
#[command(version)]
#[command(about = "Package, deploy and run Saagie jobs and graph pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Environment config to use (file name without `.json`)
    #[arg(long, alias = "saagie_env", global = true, env = "SAAGIE_ENV", default_value = "dev")]
    pub saagie_env: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Zip a job's sources into the artefact directory
    PackageJob(PackageJobCommand),

    /// Create a job or upload a new version of it
    UpdateJob(UpdateJobCommand),

    /// Run a job
    RunJob(RunJobCommand),

    /// Create a graph pipeline or upload a new version of it
    UpdatePipeline(UpdatePipelineCommand),

    /// Run a pipeline
    RunPipeline(RunPipelineCommand),

    /// Validate a pipeline graph definition file
    Validate(ValidateCommand),
}

/// Platform connection settings
#[derive(Debug, Args, Clone)]
pub struct ConnectionArgs {
    /// URL of the Saagie platform
    #[arg(long, alias = "saagie_url", global = true, env = "SAAGIE_URL")]
    pub saagie_url: Option<String>,

    /// Saagie user
    #[arg(long, alias = "saagie_user", global = true, env = "SAAGIE_USER")]
    pub saagie_user: Option<String>,

    /// Saagie user's password
    #[arg(long, alias = "saagie_pwd", global = true, env = "SAAGIE_PWD", hide_env_values = true)]
    pub saagie_pwd: Option<String>,

    /// Saagie realm
    #[arg(long, alias = "saagie_realm", global = true, env = "SAAGIE_REALM")]
    pub saagie_realm: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout: u64,
}

impl ConnectionArgs {
    /// Connection settings for the platform named by an environment config
    pub fn platform_config(&self, platform_id: &str) -> PlatformConfig {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        PlatformConfig::new(value(&self.saagie_url), platform_id)
            .with_credentials(value(&self.saagie_user), value(&self.saagie_pwd))
            .with_realm(value(&self.saagie_realm))
            .with_timeout(self.request_timeout)
    }
}

/// Locations of config files, sources and artefacts
#[derive(Debug, Args, Clone)]
pub struct PathArgs {
    /// Directory of job config files
    #[arg(long, alias = "job_config_folder", global = true, default_value = "./saagie/jobs")]
    pub job_config_dir: PathBuf,

    /// Directory of pipeline config files
    #[arg(long, alias = "pipeline_config_folder", global = true, default_value = "./saagie/pipelines")]
    pub pipeline_config_dir: PathBuf,

    /// Directory of environment config files
    #[arg(long, alias = "env_config_folder", global = true, default_value = "./saagie/envs")]
    pub env_config_dir: PathBuf,

    /// Directory holding one source directory per job
    #[arg(long, alias = "job_source_folder", global = true, default_value = "./code/jobs")]
    pub job_source_dir: PathBuf,

    /// Directory receiving packaged job archives
    #[arg(long, alias = "artefact_code_folder", global = true, default_value = "./dist")]
    pub artefact_dir: PathBuf,
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
