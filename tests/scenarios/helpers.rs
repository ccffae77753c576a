//! Test utilities: an in-memory platform and config builders

use async_trait::async_trait;
use saagie_ci::core::{EnvConfig, GraphPipeline, InstanceInfo, InstanceStatus, PipelineConfig};
use saagie_ci::execution::{DeployEvent, Deployer};
use saagie_ci::platform::{
    DeployedVersion, JobVersion, NewJob, NewPipeline, PlatformApi, PlatformError,
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Platform state kept in memory
///
/// Jobs and pipelines are keyed by `(project_id, name)`. Every mutating
/// call is recorded so scenarios can assert on what was sent.
#[derive(Default)]
pub struct MockPlatform {
    projects: HashMap<String, String>,
    technologies: HashMap<(String, String), String>,
    jobs: Mutex<HashMap<(String, String), String>>,
    aliases: HashMap<(String, String), String>,
    pipelines: Mutex<HashMap<(String, String), String>>,
    statuses: Mutex<VecDeque<InstanceStatus>>,
    pub calls: Mutex<Vec<String>>,
    pub job_versions: Mutex<Vec<JobVersion>>,
    pub new_jobs: Mutex<Vec<NewJob>>,
    pub edited_jobs: Mutex<Vec<(String, NewJob)>>,
    pub graphs: Mutex<Vec<(NewPipeline, GraphPipeline)>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, name: &str, id: &str) -> Self {
        self.projects.insert(name.to_string(), id.to_string());
        self
    }

    pub fn with_technology(mut self, catalog: &str, label: &str, id: &str) -> Self {
        self.technologies
            .insert((catalog.to_string(), label.to_string()), id.to_string());
        self
    }

    /// Register an existing job, reachable by name and by alias
    pub fn with_job(mut self, project_id: &str, name: &str, alias: &str, id: &str) -> Self {
        self.jobs
            .lock()
            .unwrap()
            .insert((project_id.to_string(), name.to_string()), id.to_string());
        self.aliases
            .insert((project_id.to_string(), alias.to_string()), id.to_string());
        self
    }

    pub fn with_pipeline(self, project_id: &str, name: &str, id: &str) -> Self {
        self.pipelines
            .lock()
            .unwrap()
            .insert((project_id.to_string(), name.to_string()), id.to_string());
        self
    }

    /// Statuses returned by successive instance polls; the last one repeats
    pub fn with_statuses(self, statuses: Vec<InstanceStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(&self) -> InstanceStatus {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(InstanceStatus::Running)
        } else {
            statuses.front().copied().unwrap_or(InstanceStatus::Running)
        }
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn project_id_by_name(&self, project_name: &str) -> Result<String, PlatformError> {
        self.projects
            .get(project_name)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("Project", project_name))
    }

    async fn job_id_by_name(
        &self,
        project_id: &str,
        job_name: &str,
    ) -> Result<Option<String>, PlatformError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .get(&(project_id.to_string(), job_name.to_string()))
            .cloned())
    }

    async fn job_id_by_alias(
        &self,
        project_id: &str,
        alias: &str,
    ) -> Result<Option<String>, PlatformError> {
        Ok(self
            .aliases
            .get(&(project_id.to_string(), alias.to_string()))
            .cloned())
    }

    async fn technology_id(&self, catalog: &str, technology: &str) -> Result<String, PlatformError> {
        self.technologies
            .get(&(catalog.to_string(), technology.to_string()))
            .cloned()
            .ok_or_else(|| PlatformError::not_found("Technology", technology))
    }

    async fn create_job(
        &self,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError> {
        self.record(format!("create_job:{}", job.name));
        let id = format!("job-{}", job.name);
        self.jobs
            .lock()
            .unwrap()
            .insert((job.project_id.clone(), job.name.clone()), id.clone());
        self.new_jobs.lock().unwrap().push(job.clone());
        self.job_versions.lock().unwrap().push(version.clone());
        Ok(DeployedVersion { id, number: Some(1) })
    }

    async fn upgrade_job(
        &self,
        job_id: &str,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError> {
        self.record(format!("upgrade_job:{}", job_id));
        self.edited_jobs
            .lock()
            .unwrap()
            .push((job_id.to_string(), job.clone()));
        self.job_versions.lock().unwrap().push(version.clone());
        Ok(DeployedVersion {
            id: job_id.to_string(),
            number: Some(2),
        })
    }

    async fn run_job(&self, job_id: &str) -> Result<InstanceInfo, PlatformError> {
        self.record(format!("run_job:{}", job_id));
        Ok(InstanceInfo::new(
            format!("{}-instance", job_id),
            InstanceStatus::Requested,
        ))
    }

    async fn job_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError> {
        Ok(InstanceInfo::new(instance_id, self.next_status()))
    }

    async fn pipeline_id_by_name(
        &self,
        project_id: &str,
        pipeline_name: &str,
    ) -> Result<Option<String>, PlatformError> {
        let pipelines = self.pipelines.lock().unwrap();
        Ok(pipelines
            .get(&(project_id.to_string(), pipeline_name.to_string()))
            .cloned())
    }

    async fn create_graph_pipeline(
        &self,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError> {
        self.record(format!("create_pipeline:{}", pipeline.name));
        let id = format!("pipeline-{}", pipeline.alias);
        self.pipelines.lock().unwrap().insert(
            (pipeline.project_id.clone(), pipeline.name.clone()),
            id.clone(),
        );
        self.graphs
            .lock()
            .unwrap()
            .push((pipeline.clone(), graph.clone()));
        Ok(DeployedVersion { id, number: Some(1) })
    }

    async fn upgrade_graph_pipeline(
        &self,
        pipeline_id: &str,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError> {
        self.record(format!("upgrade_pipeline:{}", pipeline_id));
        self.graphs
            .lock()
            .unwrap()
            .push((pipeline.clone(), graph.clone()));
        Ok(DeployedVersion {
            id: pipeline_id.to_string(),
            number: Some(2),
        })
    }

    async fn run_pipeline(&self, pipeline_id: &str) -> Result<InstanceInfo, PlatformError> {
        self.record(format!("run_pipeline:{}", pipeline_id));
        Ok(InstanceInfo::new(
            format!("{}-instance", pipeline_id),
            InstanceStatus::Requested,
        ))
    }

    async fn pipeline_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError> {
        Ok(InstanceInfo::new(instance_id, self.next_status()))
    }
}

/// Deployer over `platform` recording every emitted event
pub fn deployer_with_events(
    platform: MockPlatform,
) -> (Deployer<MockPlatform>, Arc<Mutex<Vec<DeployEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let deployer = Deployer::new(platform).with_event_handler(move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    (deployer, events)
}

pub fn env_with_project_id(project_id: &str) -> EnvConfig {
    EnvConfig::from_json(&format!(
        r#"{{"platform_id": "1", "project_id": "{}"}}"#,
        project_id
    ))
    .unwrap()
}

/// Environment `name` on project `project_id`
pub fn named_env(name: &str, project_id: &str) -> EnvConfig {
    let mut env = env_with_project_id(project_id);
    env.name = name.to_string();
    env
}

pub fn env_with_project_name(project_name: &str) -> EnvConfig {
    EnvConfig::from_json(&format!(
        r#"{{"platform_id": "1", "project_name": "{}"}}"#,
        project_name
    ))
    .unwrap()
}

/// Write `content` to `<dir>/<file_name>` and return a pipeline config pointing at it
pub fn pipeline_config(dir: &Path, file_name: &str, content: &str) -> PipelineConfig {
    let path = dir.join(file_name);
    std::fs::write(&path, content).unwrap();
    PipelineConfig { file_path: path }
}

pub const TRAINING_PIPELINE: &str = r#"
pipeline:
  name: "Sentiment training"
  description: "Prepare data, train and clean up"
  nodes:
    - job:
        node: prepare
        alias: data_preparation
        nextNodes: [check]
    - conditionStatus:
        node: check
        trigger: AllSuccess
        nextNodesSuccess: [train]
        nextNodesFailure: [cleanup]
    - job:
        node: train
        alias: train_model
    - job:
        node: cleanup
        alias: clean_data
"#;

/// Platform holding the three jobs of [`TRAINING_PIPELINE`] in project `p-1`
pub fn training_platform() -> MockPlatform {
    MockPlatform::new()
        .with_job("p-1", "Data preparation", "data_preparation", "job-prep")
        .with_job("p-1", "Train model", "train_model", "job-train")
        .with_job("p-1", "Clean data", "clean_data", "job-clean")
}
