//! Release metadata attached to new job and pipeline versions

use crate::core::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Release note used outside of CI
pub const DEFAULT_RELEASE_NOTE: &str = "WIP";

/// Release note and source URL of a new version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub release_note: String,

    /// Commit URL, empty outside of CI
    pub source_url: String,
}

impl Default for ReleaseInfo {
    fn default() -> Self {
        Self {
            release_note: DEFAULT_RELEASE_NOTE.to_string(),
            source_url: String::new(),
        }
    }
}

impl ReleaseInfo {
    /// Read the CI variables of the current process
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build release info from an arbitrary variable lookup
    ///
    /// GitHub Actions is detected through `GITHUB_SERVER_URL`; any other CI
    /// is assumed to expose the GitLab variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("CI").is_none() {
            return Ok(Self::default());
        }

        let require = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()));
        let message = lookup("CI_COMMIT_MESSAGE")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        if let Some(server) = lookup("GITHUB_SERVER_URL") {
            let source_url = format!(
                "{}/{}/commit/{}",
                server.trim_end_matches('/'),
                require("GITHUB_REPOSITORY")?,
                require("GITHUB_SHA")?
            );
            let release_note = match message {
                Some(message) => format!("{} - {}", message, source_url),
                None => format!("{} - {}", DEFAULT_RELEASE_NOTE, source_url),
            };
            Ok(Self {
                release_note,
                source_url,
            })
        } else {
            let source_url = format!(
                "{}/-/commit/{}",
                require("CI_PROJECT_URL")?.trim_end_matches('/'),
                require("CI_COMMIT_SHA")?
            );
            Ok(Self {
                release_note: message.unwrap_or_else(|| DEFAULT_RELEASE_NOTE.to_string()),
                source_url,
            })
        }
    }
}
