//! CI actions against the platform

pub mod engine;
pub mod jobs;
pub mod monitor;
pub mod pipelines;

pub use engine::{DeployEvent, DeployOutcome, Deployer, EventHandler};
pub use monitor::{InstanceKind, WaitOptions};
pub use pipelines::{NodeIdMode, PipelinePlan};
