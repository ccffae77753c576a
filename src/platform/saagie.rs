//! HTTP client for the Saagie projects GraphQL API

use crate::core::{graph::GraphPipeline, status::InstanceInfo};
use crate::platform::{
    queries,
    response::{extract, DeployedVersion, GraphQlResponse, NamedResource, PlatformError},
    JobVersion, NewJob, NewPipeline, PlatformApi, PlatformConfig,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Authenticated client of one platform
#[derive(Debug, Clone)]
pub struct SaagieClient {
    http: Client,
    graphql_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Technology {
    id: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    technologies: Vec<Technology>,
}

#[derive(Debug, Deserialize)]
struct VersionNumber {
    number: u32,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: String,
    #[serde(default)]
    versions: Vec<VersionNumber>,
}

impl CreatedResource {
    fn into_deployed(self) -> DeployedVersion {
        DeployedVersion {
            number: self.versions.iter().map(|v| v.number).max(),
            id: self.id,
        }
    }
}

/// GraphQL multipart `operations` field: the query with `variables.file` nulled
pub(crate) fn upload_operations(query: &str, variables: &Value) -> Value {
    let mut variables = variables.clone();
    variables["file"] = Value::Null;
    json!({ "query": query, "variables": variables })
}

/// GraphQL multipart `map` field binding part `0` to `variables.file`
pub(crate) fn upload_map() -> Value {
    json!({ "0": ["variables.file"] })
}

async fn check_status(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::Api {
        status: status.as_u16(),
        body,
    })
}

impl SaagieClient {
    /// Authenticate against the platform and return a ready client
    pub async fn connect(config: &PlatformConfig) -> Result<Self, PlatformError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        debug!("Connecting to Saagie ...");
        let response = http
            .post(config.authentication_url())
            .header("Saagie-Realm", &config.realm)
            .json(&json!({ "login": config.user, "password": config.password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PlatformError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token = body.trim().to_string();
        if token.is_empty() {
            return Err(PlatformError::Authentication {
                status: status.as_u16(),
                body: "empty token".to_string(),
            });
        }

        info!("Connected to {} (platform {})", config.url, config.platform_id);
        Ok(Self {
            http,
            graphql_url: config.graphql_url(),
            token,
        })
    }

    fn authorized(&self) -> RequestBuilder {
        self.http.post(&self.graphql_url).bearer_auth(&self.token)
    }

    /// Send a GraphQL document and return its `data`
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value, PlatformError> {
        let response = self
            .authorized()
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let response: GraphQlResponse = check_status(response).await?.json().await?;
        response.into_data()
    }

    /// Send a GraphQL document with `file` bound to `variables.file`
    pub async fn graphql_with_file(
        &self,
        query: &str,
        variables: Value,
        file: &Path,
    ) -> Result<Value, PlatformError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|source| PlatformError::Upload {
                path: file.to_path_buf(),
                source,
            })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());

        debug!("Uploading {} ({} bytes)", file.display(), bytes.len());
        let form = Form::new()
            .text("operations", upload_operations(query, &variables).to_string())
            .text("map", upload_map().to_string())
            .part("0", Part::bytes(bytes).file_name(file_name));

        let response = self.authorized().multipart(form).send().await?;
        let response: GraphQlResponse = check_status(response).await?.json().await?;
        response.into_data()
    }

    async fn graphql_maybe_upload(
        &self,
        query: &str,
        variables: Value,
        file: Option<&Path>,
    ) -> Result<Value, PlatformError> {
        match file {
            Some(file) => self.graphql_with_file(query, variables, file).await,
            None => self.graphql(query, variables).await,
        }
    }

    async fn instance(
        &self,
        query: &str,
        field: &str,
        instance_id: &str,
    ) -> Result<InstanceInfo, PlatformError> {
        let data = self.graphql(query, json!({ "id": instance_id })).await?;
        extract::<Option<InstanceInfo>>(&data, &format!("/{}", field))?
            .ok_or_else(|| PlatformError::not_found("Instance", instance_id))
    }
}

#[async_trait]
impl PlatformApi for SaagieClient {
    async fn project_id_by_name(&self, project_name: &str) -> Result<String, PlatformError> {
        let data = self.graphql(queries::PROJECTS, json!({})).await?;
        let projects: Vec<NamedResource> = extract(&data, "/projects")?;
        projects
            .into_iter()
            .find(|p| p.name == project_name)
            .map(|p| p.id)
            .ok_or_else(|| PlatformError::not_found("Project", project_name))
    }

    async fn job_id_by_name(
        &self,
        project_id: &str,
        job_name: &str,
    ) -> Result<Option<String>, PlatformError> {
        let data = self
            .graphql(queries::JOBS, json!({ "projectId": project_id }))
            .await?;
        let jobs: Vec<NamedResource> = extract(&data, "/jobs")?;
        Ok(jobs.into_iter().find(|j| j.name == job_name).map(|j| j.id))
    }

    async fn job_id_by_alias(
        &self,
        project_id: &str,
        alias: &str,
    ) -> Result<Option<String>, PlatformError> {
        let data = self
            .graphql(
                queries::JOB_BY_ALIAS,
                json!({ "projectId": project_id, "alias": alias }),
            )
            .await?;
        let job: Option<NamedResource> = extract(&data, "/jobByAlias")?;
        Ok(job.map(|j| j.id))
    }

    async fn technology_id(&self, catalog: &str, technology: &str) -> Result<String, PlatformError> {
        let data = self.graphql(queries::REPOSITORIES, json!({})).await?;
        let repositories: Vec<Repository> = extract(&data, "/repositories")?;
        let repository = repositories
            .into_iter()
            .find(|r| r.name.eq_ignore_ascii_case(catalog))
            .ok_or_else(|| PlatformError::not_found("Technology catalog", catalog))?;
        repository
            .technologies
            .into_iter()
            .find(|t| t.label.eq_ignore_ascii_case(technology))
            .map(|t| t.id)
            .ok_or_else(|| {
                PlatformError::not_found("Technology", format!("{} in {}", technology, catalog))
            })
    }

    async fn create_job(
        &self,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError> {
        let variables = json!({
            "job": job.to_variables(),
            "jobVersion": version.to_variables(),
        });
        let data = self
            .graphql_maybe_upload(queries::CREATE_JOB, variables, version.file.as_deref())
            .await?;
        let created: CreatedResource = extract(&data, "/createJob")?;
        Ok(created.into_deployed())
    }

    async fn upgrade_job(
        &self,
        job_id: &str,
        job: &NewJob,
        version: &JobVersion,
    ) -> Result<DeployedVersion, PlatformError> {
        self.graphql(queries::EDIT_JOB, json!({ "job": job.to_edition(job_id) }))
            .await?;

        let variables = json!({
            "jobId": job_id,
            "jobVersion": version.to_variables(),
        });
        let data = self
            .graphql_maybe_upload(queries::ADD_JOB_VERSION, variables, version.file.as_deref())
            .await?;
        let added: VersionNumber = extract(&data, "/addJobVersion")?;
        Ok(DeployedVersion {
            id: job_id.to_string(),
            number: Some(added.number),
        })
    }

    async fn run_job(&self, job_id: &str) -> Result<InstanceInfo, PlatformError> {
        let data = self
            .graphql(queries::RUN_JOB, json!({ "jobId": job_id }))
            .await?;
        extract(&data, "/runJob")
    }

    async fn job_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError> {
        self.instance(queries::JOB_INSTANCE, "jobInstance", instance_id)
            .await
    }

    async fn pipeline_id_by_name(
        &self,
        project_id: &str,
        pipeline_name: &str,
    ) -> Result<Option<String>, PlatformError> {
        let data = self
            .graphql(queries::PIPELINES, json!({ "projectId": project_id }))
            .await?;
        let pipelines: Option<Vec<NamedResource>> = extract(&data, "/project/pipelines")?;
        Ok(pipelines
            .unwrap_or_default()
            .into_iter()
            .find(|p| p.name == pipeline_name)
            .map(|p| p.id))
    }

    async fn create_graph_pipeline(
        &self,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError> {
        let data = self
            .graphql(
                queries::CREATE_GRAPH_PIPELINE,
                json!({ "pipeline": pipeline.to_variables(graph) }),
            )
            .await?;
        let created: CreatedResource = extract(&data, "/createGraphPipeline")?;
        Ok(created.into_deployed())
    }

    async fn upgrade_graph_pipeline(
        &self,
        pipeline_id: &str,
        pipeline: &NewPipeline,
        graph: &GraphPipeline,
    ) -> Result<DeployedVersion, PlatformError> {
        self.graphql(
            queries::EDIT_PIPELINE,
            json!({ "pipeline": pipeline.to_edition(pipeline_id) }),
        )
        .await?;

        let data = self
            .graphql(
                queries::ADD_GRAPH_PIPELINE_VERSION,
                json!({
                    "pipelineId": pipeline_id,
                    "graph": graph,
                    "releaseNote": pipeline.release_note,
                    "sourceUrl": pipeline.source_url,
                }),
            )
            .await?;
        let added: VersionNumber = extract(&data, "/addGraphPipelineVersion")?;
        Ok(DeployedVersion {
            id: pipeline_id.to_string(),
            number: Some(added.number),
        })
    }

    async fn run_pipeline(&self, pipeline_id: &str) -> Result<InstanceInfo, PlatformError> {
        let data = self
            .graphql(queries::RUN_PIPELINE, json!({ "pipelineId": pipeline_id }))
            .await?;
        extract(&data, "/runPipeline")
    }

    async fn pipeline_instance(&self, instance_id: &str) -> Result<InstanceInfo, PlatformError> {
        self.instance(queries::PIPELINE_INSTANCE, "pipelineInstance", instance_id)
            .await
    }
}
