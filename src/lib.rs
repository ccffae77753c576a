//! saagie-ci - Continuous integration for Saagie jobs and graph pipelines

pub mod cli;
pub mod core;
pub mod execution;
pub mod packaging;
pub mod platform;

// Re-export commonly used types
pub use core::{EnvConfig, JobConfig, PipelineConfig, PipelineDefinition, ReleaseInfo};
pub use core::{GraphPipeline, InstanceInfo, InstanceStatus};
pub use execution::{DeployEvent, DeployOutcome, Deployer, InstanceKind, NodeIdMode, WaitOptions};
pub use platform::{PlatformApi, PlatformConfig, PlatformError, SaagieClient};
