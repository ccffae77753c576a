//! Deployment engine - shared state of every CI action

use crate::{
    core::{config::EnvConfig, status::{InstanceInfo, InstanceStatus}},
    execution::monitor::InstanceKind,
    platform::{DeployedVersion, PlatformApi},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Events that can occur while deploying or running
#[derive(Debug, Clone)]
pub enum DeployEvent {
    ProjectResolved {
        project_id: String,
    },
    JobAliasResolved {
        alias: String,
        job_id: String,
    },
    GraphBuilt {
        pipeline_name: String,
        job_nodes: usize,
        condition_nodes: usize,
    },
    JobDeployed {
        job_name: String,
        outcome: DeployOutcome,
    },
    PipelineDeployed {
        pipeline_name: String,
        outcome: DeployOutcome,
    },
    InstanceStarted {
        kind: InstanceKind,
        name: String,
        instance: InstanceInfo,
    },
    InstanceStatusChanged {
        kind: InstanceKind,
        instance_id: String,
        status: InstanceStatus,
    },
    InstanceFinished {
        kind: InstanceKind,
        instance_id: String,
        status: InstanceStatus,
    },
}

/// Whether a deployment created a resource or added a version to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Created(DeployedVersion),
    Upgraded(DeployedVersion),
}

impl DeployOutcome {
    pub fn version(&self) -> &DeployedVersion {
        match self {
            DeployOutcome::Created(version) | DeployOutcome::Upgraded(version) => version,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, DeployOutcome::Created(_))
    }
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&DeployEvent) + Send + Sync>;

/// Runs CI actions against a platform
pub struct Deployer<P> {
    pub(crate) platform: P,
    event_handlers: Vec<EventHandler>,
}

impl<P: PlatformApi> Deployer<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DeployEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Emit an event to all handlers
    pub(crate) fn emit(&self, event: DeployEvent) {
        debug!("{:?}", event);
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Project id of an environment, looked up by name when not configured
    pub async fn resolve_project_id(&self, env: &EnvConfig) -> Result<String> {
        let project_id = match (&env.project_id, &env.project_name) {
            (Some(id), _) => id.clone(),
            (None, Some(name)) => {
                debug!("Getting project ID: [{}] ...", name);
                self.platform
                    .project_id_by_name(name)
                    .await
                    .with_context(|| format!("Failed to resolve project [{}]", name))?
            }
            (None, None) => anyhow::bail!("Environment config has no project_id or project_name"),
        };
        info!("Project ID: {}", project_id);
        self.emit(DeployEvent::ProjectResolved {
            project_id: project_id.clone(),
        });
        Ok(project_id)
    }
}
