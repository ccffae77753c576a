//! Polling of running job and pipeline instances

use crate::{
    core::status::InstanceInfo,
    execution::{DeployEvent, Deployer},
    platform::PlatformApi,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What kind of resource an instance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceKind {
    Job,
    Pipeline,
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKind::Job => f.write_str("job"),
            InstanceKind::Pipeline => f.write_str("pipeline"),
        }
    }
}

/// Polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Give up after this long; wait forever when `None`
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: None,
        }
    }
}

impl<P: PlatformApi> Deployer<P> {
    async fn fetch_instance(&self, kind: InstanceKind, instance_id: &str) -> Result<InstanceInfo> {
        let instance = match kind {
            InstanceKind::Job => self.platform.job_instance(instance_id).await,
            InstanceKind::Pipeline => self.platform.pipeline_instance(instance_id).await,
        };
        instance.with_context(|| format!("Failed to get {} instance [{}]", kind, instance_id))
    }

    /// Poll `instance` until it reaches a terminal status
    ///
    /// Emits a status-change event on every transition and returns the
    /// final instance. Failing statuses are returned, not raised; the caller
    /// decides how to report them.
    pub async fn wait_for_instance(
        &self,
        kind: InstanceKind,
        instance: InstanceInfo,
        options: WaitOptions,
    ) -> Result<InstanceInfo> {
        let started = Instant::now();
        let mut current = instance;

        while !current.status.is_terminal() {
            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    warn!(
                        "Stopped waiting for {} instance [{}] in status {}",
                        kind, current.id, current.status
                    );
                    anyhow::bail!(
                        "Timed out after {}s waiting for {} instance [{}] (last status {})",
                        timeout.as_secs(),
                        kind,
                        current.id,
                        current.status
                    );
                }
            }

            tokio::time::sleep(options.poll_interval).await;
            let next = self.fetch_instance(kind, &current.id).await?;
            debug!("{} instance [{}]: {}", kind, next.id, next.status);

            if next.status != current.status {
                self.emit(DeployEvent::InstanceStatusChanged {
                    kind,
                    instance_id: next.id.clone(),
                    status: next.status,
                });
            }
            current = next;
        }

        info!("{} instance [{}] finished: {}", kind, current.id, current.status);
        self.emit(DeployEvent::InstanceFinished {
            kind,
            instance_id: current.id.clone(),
            status: current.status,
        });
        Ok(current)
    }
}
