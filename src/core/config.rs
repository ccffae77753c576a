//! Configuration files describing environments, jobs and pipelines
//!
//! Every file kind is looked up by name inside its own directory, so
//! `EnvConfig::load("./saagie/envs", "dev")` reads `./saagie/envs/dev.json`.

use crate::core::status::InstanceStatus;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration or definition files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error when loading {kind} file: [{path}]: {source}")]
    Io {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {kind} file: [{path}]: {message}")]
    Parse {
        kind: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Pipeline definition file must be a json or yaml file: [{0}]")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Deployment parameters of one environment (`dev`, `prod`, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Environment name, the file stem the config was loaded from
    #[serde(skip)]
    pub name: String,

    /// Platform identifier, part of the GraphQL endpoint
    pub platform_id: String,

    /// Project identifier
    #[serde(default, deserialize_with = "non_empty")]
    pub project_id: Option<String>,

    /// Project name, used when no project id is configured
    #[serde(default, deserialize_with = "non_empty")]
    pub project_name: Option<String>,
}

/// Docker image settings of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerInfo {
    pub image: String,

    #[serde(default, deserialize_with = "non_empty")]
    pub docker_credentials_id: Option<String>,
}

/// Scheduling, resources and alerting of a job
///
/// Every field is optional so per-environment settings can override the
/// job-wide ones field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSchedule {
    #[serde(default)]
    pub is_scheduled: Option<bool>,

    /// Cron expression, required when the job is scheduled
    #[serde(default, deserialize_with = "non_empty")]
    pub cron_scheduling: Option<String>,

    /// Time zone of the cron expression, `UTC` when absent
    #[serde(default, deserialize_with = "non_empty")]
    pub schedule_timezone: Option<String>,

    /// CPU and memory requests/limits, passed to the platform as is
    #[serde(default)]
    pub resources: Option<Value>,

    /// Alert recipients
    #[serde(default)]
    pub emails: Option<Vec<String>>,

    /// Instance statuses that trigger an alert
    #[serde(default)]
    pub status_list: Option<Vec<String>>,
}

impl JobSchedule {
    /// `self` with every field set in `other` replaced
    pub fn overridden_by(&self, other: &JobSchedule) -> JobSchedule {
        JobSchedule {
            is_scheduled: other.is_scheduled.or(self.is_scheduled),
            cron_scheduling: other.cron_scheduling.clone().or_else(|| self.cron_scheduling.clone()),
            schedule_timezone: other
                .schedule_timezone
                .clone()
                .or_else(|| self.schedule_timezone.clone()),
            resources: other.resources.clone().or_else(|| self.resources.clone()),
            emails: other.emails.clone().or_else(|| self.emails.clone()),
            status_list: other.status_list.clone().or_else(|| self.status_list.clone()),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.is_scheduled.unwrap_or(false)
    }

    /// Whether alerting is configured
    pub fn has_alerting(&self) -> bool {
        self.emails.as_ref().is_some_and(|e| !e.is_empty())
            || self.status_list.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn validate(&self, job_name: &str) -> Result<(), ConfigError> {
        if self.is_scheduled() && self.cron_scheduling.is_none() {
            return Err(ConfigError::Invalid(format!(
                "job [{}] is scheduled but has no cron_scheduling",
                job_name
            )));
        }
        for status in self.status_list.iter().flatten() {
            if InstanceStatus::parse(status) == InstanceStatus::Unknown
                && !status.eq_ignore_ascii_case("UNKNOWN")
            {
                return Err(ConfigError::Invalid(format!(
                    "job [{}] has an invalid alert status: {}",
                    job_name, status
                )));
            }
        }
        Ok(())
    }
}

/// Job definition as committed next to the job sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name on the platform
    pub job_name: String,

    /// Path of the packaged artifact to upload
    #[serde(default, deserialize_with = "non_empty")]
    pub file_path: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub category: Option<String>,

    /// Technology label, e.g. `python`
    #[serde(default, deserialize_with = "non_empty")]
    pub technology: Option<String>,

    /// Catalog (repository) holding the technology
    #[serde(default, deserialize_with = "non_empty")]
    pub technology_catalog: Option<String>,

    /// Runtime context of the technology, e.g. `3.9`
    #[serde(default, deserialize_with = "non_empty")]
    pub runtime_version: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub command_line: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub extra_technology: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub extra_technology_version: Option<String>,

    #[serde(default)]
    pub docker_info: Option<DockerInfo>,

    /// Scheduling and alerting shared by every environment
    #[serde(flatten)]
    pub schedule: JobSchedule,

    /// Per-environment overrides of `schedule`, keyed by environment name
    #[serde(default)]
    pub env: HashMap<String, JobSchedule>,
}

/// Pointer from a pipeline name to its graph definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path of the JSON or YAML graph definition
    pub file_path: PathBuf,
}

/// Empty strings count as absent
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn read_file(kind: &'static str, path: &Path) -> Result<String, ConfigError> {
    debug!("Loading {} file: [{}] ...", kind, path.display());
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

fn load_json<T: DeserializeOwned>(kind: &'static str, path: &Path) -> Result<T, ConfigError> {
    let content = read_file(kind, path)?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        kind,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Path of `<dir>/<name>.json`
pub fn config_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

impl EnvConfig {
    /// Load `<dir>/<env>.json`
    pub fn load(dir: &Path, env: &str) -> Result<Self, ConfigError> {
        let mut config: Self = load_json("env config", &config_path(dir, env))?;
        config.validate()?;
        config.name = env.to_string();
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform_id.trim().is_empty() {
            return Err(ConfigError::Invalid("platform_id must not be empty".to_string()));
        }
        if self.project_id.is_none() && self.project_name.is_none() {
            return Err(ConfigError::Invalid(
                "environment needs a project_id or a project_name".to_string(),
            ));
        }
        Ok(())
    }
}

impl JobConfig {
    /// Load `<dir>/<job>.json`
    pub fn load(dir: &Path, job: &str) -> Result<Self, ConfigError> {
        load_json("job config", &config_path(dir, job))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Scheduling of the job in environment `env`, validated
    pub fn schedule_for(&self, env: &str) -> Result<JobSchedule, ConfigError> {
        let schedule = match self.env.get(env) {
            Some(overrides) => self.schedule.overridden_by(overrides),
            None => self.schedule.clone(),
        };
        schedule.validate(&self.job_name)?;
        Ok(schedule)
    }

    /// Whether this job ships a packaged artifact
    pub fn has_artifact(&self) -> bool {
        self.file_path.is_some()
    }
}

impl PipelineConfig {
    /// Load `<dir>/<pipeline>.json`
    pub fn load(dir: &Path, pipeline: &str) -> Result<Self, ConfigError> {
        load_json("pipeline config", &config_path(dir, pipeline))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
