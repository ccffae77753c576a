//! Platform API client for deploying and running jobs and pipelines

pub mod client;
pub mod queries;
pub mod response;
pub mod saagie;

use crate::core::{
    config::{DockerInfo, JobSchedule},
    graph::GraphPipeline,
    status::InstanceInfo,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;

pub use client::PlatformConfig;
pub use response::{DeployedVersion, NamedResource, PlatformError};
pub use saagie::SaagieClient;

/// Catalog searched when a job config names no technology catalog
pub const DEFAULT_TECHNOLOGY_CATALOG: &str = "Saagie";

/// Trait for platform access - allows for different implementations
///
/// Lookups return `Ok(None)` when the resource does not exist and reserve
/// errors for transport or server failures.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Resolve a project id from its name
    async fn project_id_by_name(&self, project_name: &str) -> Result<String, PlatformError>;

    async fn job_id_by_name(
        &self,
        project_id: &str,
        job_name: &str,
    ) -> Result<Option<String>, PlatformError>;

    async fn job_id_by_alias(
        &self,
        project_id: &str,
        alias: &str,
    ) -> Result<Option<String>, PlatformError>;

    /// Resolve a technology id from its label inside a catalog
    async fn technology_id(&self, catalog: &str, technology: &str) -> Result<String, PlatformError>;

    async fn create_job(
        &self,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError>;

    /// Add a version to an existing job and update its settings
    async fn upgrade_job(
        &self,
        job_id: &str,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError>;

    async fn run_job(&self, job_id: &str) -> Result<InstanceInfo, PlatformError>;

    async fn job_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError>;

    async fn pipeline_id_by_name(
        &self,
        project_id: &str,
        pipeline_name: &str,
    ) -> Result<Option<String>, PlatformError>;

    async fn create_graph_pipeline(
        &self,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError>;

    /// Add a graph version to an existing pipeline and update its settings
    async fn upgrade_graph_pipeline(
        &self,
        pipeline_id: &str,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError>;

    async fn run_pipeline(&self, pipeline_id: &str) -> Result<InstanceInfo, PlatformError>;

    async fn pipeline_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError>;
}

/// Job-level settings used when creating or editing a job
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Only sent on creation, the technology of a job is fixed afterwards
    pub technology_id: Option<String>,
    pub schedule: JobSchedule,
}

impl NewJob {
    pub fn to_variables(&self) -> Value {
        let mut job = json!({
            "projectId": self.project_id,
            "name": self.name,
            "description": self.description,
            "category": self.category,
        });
        if let Some(technology_id) = &self.technology_id {
            job["technology"] = json!({ "id": technology_id });
        }
        self.add_schedule(&mut job);
        job
    }

    /// Settings sent when an existing job is edited
    pub fn to_edition(&self, job_id: &str) -> Value {
        let mut job = json!({
            "id": job_id,
            "name": self.name,
            "description": self.description,
        });
        self.add_schedule(&mut job);
        job
    }

    fn add_schedule(&self, job: &mut Value) {
        let schedule = &self.schedule;
        job["isScheduled"] = json!(schedule.is_scheduled());
        if schedule.is_scheduled() {
            job["cronScheduling"] = json!(schedule.cron_scheduling);
            job["scheduleTimezone"] =
                json!(schedule.schedule_timezone.as_deref().unwrap_or("UTC"));
        }
        if let Some(resources) = &schedule.resources {
            job["resources"] = resources.clone();
        }
        if schedule.has_alerting() {
            let statuses: Vec<String> = schedule
                .status_list
                .iter()
                .flatten()
                .map(|s| s.to_uppercase())
                .collect();
            job["alerting"] = json!({
                "emails": schedule.emails.clone().unwrap_or_default(),
                "statusList": statuses,
                "loginEmails": [],
            });
        }
    }
}

/// Secondary technology of a job version (e.g. Java on a Spark job)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraTechnology {
    pub language: String,
    pub version: String,
}

/// Settings of a new job version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobVersion {
    pub command_line: Option<String>,
    pub runtime_version: Option<String>,
    pub release_note: String,
    pub source_url: String,
    pub extra_technology: Option<ExtraTechnology>,
    pub docker_info: Option<DockerInfo>,
    pub use_previous_artifact: bool,
    /// Artifact uploaded with the version
    pub file: Option<PathBuf>,
}

impl JobVersion {
    pub fn to_variables(&self) -> Value {
        let mut version = json!({
            "commandLine": self.command_line,
            "runtimeContextId": self.runtime_version,
            "releaseNote": self.release_note,
            "sourceUrl": self.source_url,
            "usePreviousArtifact": self.use_previous_artifact,
        });
        if let Some(extra) = &self.extra_technology {
            version["extraTechnology"] = json!({
                "language": extra.language,
                "version": extra.version,
            });
        }
        if let Some(docker) = &self.docker_info {
            version["dockerInfo"] = json!({
                "image": docker.image,
                "dockerCredentialsId": docker.docker_credentials_id,
            });
        }
        version
    }
}

/// Pipeline-level settings of a graph pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPipeline {
    pub project_id: String,
    pub name: String,
    pub alias: String,
    pub description: Option<String>,
    pub release_note: String,
    pub source_url: String,
    pub has_execution_variables_enabled: Option<bool>,
}

impl NewPipeline {
    pub fn to_variables(&self, graph: &GraphPipeline) -> Value {
        json!({
            "projectId": self.project_id,
            "name": self.name,
            "alias": self.alias,
            "description": self.description,
            "releaseNote": self.release_note,
            "sourceUrl": self.source_url,
            "hasExecutionVariablesEnabled": self.has_execution_variables_enabled,
            "graph": graph,
        })
    }

    /// Settings sent when an existing pipeline is edited
    pub fn to_edition(&self, pipeline_id: &str) -> Value {
        json!({
            "id": pipeline_id,
            "name": self.name,
            "alias": self.alias,
            "description": self.description,
            "hasExecutionVariablesEnabled": self.has_execution_variables_enabled,
        })
    }
}
