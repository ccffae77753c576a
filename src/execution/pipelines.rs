//! Pipeline actions: build the graph, create or upgrade, run

use crate::{
    core::{
        config::{EnvConfig, PipelineConfig},
        definition::PipelineDefinition,
        graph::{build_graph, GraphPipeline, NodeIds},
        release::ReleaseInfo,
        status::InstanceInfo,
    },
    execution::{DeployEvent, DeployOutcome, Deployer, InstanceKind},
    platform::{NewPipeline, PlatformApi},
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// How node ids of a new graph version are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeIdMode {
    /// New ids on every deployment
    #[default]
    Random,
    /// Ids derived from project, pipeline alias and node name
    Stable,
}

/// Everything needed to create or upgrade a pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePlan {
    /// Id of the pipeline when it already exists
    pub existing_id: Option<String>,
    #[serde(skip)]
    pub pipeline: NewPipeline,
    pub name: String,
    pub alias: String,
    pub graph: GraphPipeline,
}

impl<P: PlatformApi> Deployer<P> {
    /// Resolve every job alias of `definition` to a platform job id
    pub async fn resolve_job_aliases(
        &self,
        definition: &PipelineDefinition,
        project_id: &str,
    ) -> Result<HashMap<String, String>> {
        let mut job_ids = HashMap::new();
        for alias in definition.job_aliases() {
            debug!("Getting job ID of alias: [{}] ...", alias);
            let job_id = self
                .platform
                .job_id_by_alias(project_id, alias)
                .await
                .with_context(|| format!("Failed to look up job alias [{}]", alias))?
                .with_context(|| {
                    format!("No job with alias [{}] in project {}", alias, project_id)
                })?;
            self.emit(DeployEvent::JobAliasResolved {
                alias: alias.to_string(),
                job_id: job_id.clone(),
            });
            job_ids.insert(alias.to_string(), job_id);
        }
        Ok(job_ids)
    }

    /// Load the definition, resolve its jobs and build the graph without deploying
    pub async fn plan_pipeline(
        &self,
        config: &PipelineConfig,
        env: &EnvConfig,
        release: &ReleaseInfo,
        mode: NodeIdMode,
    ) -> Result<PipelinePlan> {
        let definition = PipelineDefinition::from_file(&config.file_path)?;
        let project_id = self.resolve_project_id(env).await?;
        let alias = definition.resolved_alias();

        let job_ids = self.resolve_job_aliases(&definition, &project_id).await?;
        let mut ids = match mode {
            NodeIdMode::Random => NodeIds::random(),
            NodeIdMode::Stable => NodeIds::deterministic(&format!("{}/{}", project_id, alias)),
        };
        debug!("Node id strategy: {:?}", ids.strategy());
        let graph = build_graph(&definition, &job_ids, &mut ids)
            .with_context(|| format!("Failed to build graph of pipeline [{}]", definition.name))?;

        self.emit(DeployEvent::GraphBuilt {
            pipeline_name: definition.name.clone(),
            job_nodes: graph.job_nodes.len(),
            condition_nodes: graph.condition_nodes.len(),
        });

        let existing_id = self
            .platform
            .pipeline_id_by_name(&project_id, &definition.name)
            .await
            .with_context(|| format!("Failed to look up pipeline [{}]", definition.name))?;

        let pipeline = NewPipeline {
            project_id,
            name: definition.name.clone(),
            alias: alias.clone(),
            description: definition.description.clone(),
            release_note: release.release_note.clone(),
            source_url: release.source_url.clone(),
            has_execution_variables_enabled: definition.execution_variables,
        };

        Ok(PipelinePlan {
            existing_id,
            name: definition.name,
            alias,
            pipeline,
            graph,
        })
    }

    /// Create the pipeline, or add a graph version when it already exists
    pub async fn create_or_upgrade_pipeline(
        &self,
        config: &PipelineConfig,
        env: &EnvConfig,
        release: &ReleaseInfo,
        mode: NodeIdMode,
    ) -> Result<DeployOutcome> {
        let plan = self.plan_pipeline(config, env, release, mode).await?;

        let outcome = match &plan.existing_id {
            Some(pipeline_id) => {
                info!("Upgrading pipeline: [{}] ({})", plan.name, pipeline_id);
                let deployed = self
                    .platform
                    .upgrade_graph_pipeline(pipeline_id, &plan.pipeline, &plan.graph)
                    .await
                    .with_context(|| format!("Failed to upgrade pipeline [{}]", plan.name))?;
                DeployOutcome::Upgraded(deployed)
            }
            None => {
                info!("Creating pipeline: [{}] (alias {})", plan.name, plan.alias);
                let deployed = self
                    .platform
                    .create_graph_pipeline(&plan.pipeline, &plan.graph)
                    .await
                    .with_context(|| format!("Failed to create pipeline [{}]", plan.name))?;
                DeployOutcome::Created(deployed)
            }
        };

        self.emit(DeployEvent::PipelineDeployed {
            pipeline_name: plan.name,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Start a run of the pipeline named in the definition
    pub async fn run_pipeline(
        &self,
        config: &PipelineConfig,
        env: &EnvConfig,
    ) -> Result<InstanceInfo> {
        let definition = PipelineDefinition::from_file(&config.file_path)?;
        let project_id = self.resolve_project_id(env).await?;

        debug!("Getting pipeline ID of {} ...", definition.name);
        let pipeline_id = self
            .platform
            .pipeline_id_by_name(&project_id, &definition.name)
            .await
            .with_context(|| format!("Failed to look up pipeline [{}]", definition.name))?
            .with_context(|| {
                format!(
                    "Pipeline [{}] does not exist in project {}",
                    definition.name, project_id
                )
            })?;
        info!("Pipeline ID: {}", pipeline_id);

        debug!("Running pipeline: [{}] ...", pipeline_id);
        let instance = self
            .platform
            .run_pipeline(&pipeline_id)
            .await
            .with_context(|| format!("Failed to run pipeline [{}]", definition.name))?;

        self.emit(DeployEvent::InstanceStarted {
            kind: InstanceKind::Pipeline,
            name: definition.name,
            instance: instance.clone(),
        });
        Ok(instance)
    }
}
