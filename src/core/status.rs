//! Job and pipeline instance states

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a job or pipeline instance as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    /// Run was requested but not yet scheduled
    Requested,
    Queued,
    Running,
    Succeeded,
    Failed,
    /// Kill was requested
    Killing,
    Killed,
    /// Pipeline is waiting on a condition
    Awaiting,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Parse a platform status string, mapping anything unexpected to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "REQUESTED" => InstanceStatus::Requested,
            "QUEUED" => InstanceStatus::Queued,
            "RUNNING" => InstanceStatus::Running,
            "SUCCEEDED" => InstanceStatus::Succeeded,
            "FAILED" => InstanceStatus::Failed,
            "KILLING" => InstanceStatus::Killing,
            "KILLED" => InstanceStatus::Killed,
            "AWAITING" => InstanceStatus::Awaiting,
            "SKIPPED" => InstanceStatus::Skipped,
            _ => InstanceStatus::Unknown,
        }
    }

    /// Check if the instance will not change state anymore
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Succeeded
                | InstanceStatus::Failed
                | InstanceStatus::Killed
                | InstanceStatus::Skipped
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InstanceStatus::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Requested => "REQUESTED",
            InstanceStatus::Queued => "QUEUED",
            InstanceStatus::Running => "RUNNING",
            InstanceStatus::Succeeded => "SUCCEEDED",
            InstanceStatus::Failed => "FAILED",
            InstanceStatus::Killing => "KILLING",
            InstanceStatus::Killed => "KILLED",
            InstanceStatus::Awaiting => "AWAITING",
            InstanceStatus::Skipped => "SKIPPED",
            InstanceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job or pipeline instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub id: String,

    pub status: InstanceStatus,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl InstanceInfo {
    pub fn new(id: impl Into<String>, status: InstanceStatus) -> Self {
        Self {
            id: id.into(),
            status,
            start_time: None,
            end_time: None,
        }
    }
}
