//! Job actions: create or upgrade, run

use crate::{
    core::{
        config::{EnvConfig, JobConfig},
        release::ReleaseInfo,
        status::InstanceInfo,
    },
    execution::{DeployEvent, DeployOutcome, Deployer, InstanceKind},
    platform::{ExtraTechnology, JobVersion, NewJob, PlatformApi, DEFAULT_TECHNOLOGY_CATALOG},
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Version settings of `job`
pub fn job_version(job: &JobConfig, release: &ReleaseInfo) -> Result<JobVersion> {
    let extra_technology = match (&job.extra_technology, &job.extra_technology_version) {
        (Some(language), Some(version)) => Some(ExtraTechnology {
            language: language.clone(),
            version: version.clone(),
        }),
        (None, None) => None,
        _ => anyhow::bail!(
            "Job [{}] must set both extra_technology and extra_technology_version",
            job.job_name
        ),
    };

    Ok(JobVersion {
        command_line: job.command_line.clone(),
        runtime_version: job.runtime_version.clone(),
        release_note: release.release_note.clone(),
        source_url: release.source_url.clone(),
        extra_technology,
        docker_info: job.docker_info.clone(),
        use_previous_artifact: false,
        file: job.file_path.as_ref().map(PathBuf::from),
    })
}

impl<P: PlatformApi> Deployer<P> {
    /// Create the job, or add a version when a job with the same name exists
    pub async fn create_or_upgrade_job(
        &self,
        job: &JobConfig,
        env: &EnvConfig,
        release: &ReleaseInfo,
    ) -> Result<DeployOutcome> {
        let version = job_version(job, release)?;
        let schedule = job.schedule_for(&env.name)?;
        let project_id = self.resolve_project_id(env).await?;
        let mut new_job = NewJob {
            project_id: project_id.clone(),
            name: job.job_name.clone(),
            description: job.description.clone(),
            category: job.category.clone(),
            technology_id: None,
            schedule,
        };

        debug!("Getting job ID: [{}] ...", job.job_name);
        let existing = self
            .platform
            .job_id_by_name(&project_id, &job.job_name)
            .await
            .with_context(|| format!("Failed to look up job [{}]", job.job_name))?;

        let outcome = match existing {
            Some(job_id) => {
                info!("Upgrading job: [{}] ({})", job.job_name, job_id);
                let deployed = self
                    .platform
                    .upgrade_job(&job_id, &new_job, &version)
                    .await
                    .with_context(|| format!("Failed to upgrade job [{}]", job.job_name))?;
                DeployOutcome::Upgraded(deployed)
            }
            None => {
                if let Some(technology) = &job.technology {
                    let catalog = job
                        .technology_catalog
                        .as_deref()
                        .unwrap_or(DEFAULT_TECHNOLOGY_CATALOG);
                    let technology_id = self
                        .platform
                        .technology_id(catalog, technology)
                        .await
                        .with_context(|| format!("Failed to resolve technology [{}]", technology))?;
                    new_job.technology_id = Some(technology_id);
                }

                info!("Creating job: [{}]", job.job_name);
                let deployed = self
                    .platform
                    .create_job(&new_job, &version)
                    .await
                    .with_context(|| format!("Failed to create job [{}]", job.job_name))?;
                DeployOutcome::Created(deployed)
            }
        };

        self.emit(DeployEvent::JobDeployed {
            job_name: job.job_name.clone(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Start a run of the job and return the new instance
    pub async fn run_job(&self, job: &JobConfig, env: &EnvConfig) -> Result<InstanceInfo> {
        let project_id = self.resolve_project_id(env).await?;

        debug!("Getting job ID: [{}] ...", job.job_name);
        let job_id = self
            .platform
            .job_id_by_name(&project_id, &job.job_name)
            .await
            .with_context(|| format!("Failed to look up job [{}]", job.job_name))?
            .with_context(|| format!("Job [{}] does not exist in project {}", job.job_name, project_id))?;
        info!("Job ID: {}", job_id);

        debug!("Running job: [{}] ...", job_id);
        let instance = self
            .platform
            .run_job(&job_id)
            .await
            .with_context(|| format!("Failed to run job [{}]", job.job_name))?;

        self.emit(DeployEvent::InstanceStarted {
            kind: InstanceKind::Job,
            name: job.job_name.clone(),
            instance: instance.clone(),
        });
        Ok(instance)
    }
}
