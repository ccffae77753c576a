//! Platform connection settings

use crate::platform::PlatformError;
use std::fmt;

/// Default timeout of a single HTTP request
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the platform client
#[derive(Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform, e.g. `https://acme-workspace.saagie.io`
    pub url: String,

    /// Platform identifier inside the realm
    pub platform_id: String,

    pub user: String,

    pub password: String,

    /// Realm (tenant) sent with the authentication request
    pub realm: String,

    /// Timeout for requests in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("url", &self.url)
            .field("platform_id", &self.platform_id)
            .field("user", &self.user)
            .field("password", &"***")
            .field("realm", &self.realm)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PlatformConfig {
    pub fn new(url: impl Into<String>, platform_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform_id: platform_id.into(),
            user: String::new(),
            password: String::new(),
            realm: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Base URL with exactly one trailing slash
    pub fn base_url(&self) -> String {
        format!("{}/", self.url.trim_end_matches('/'))
    }

    pub fn authentication_url(&self) -> String {
        format!("{}authentication/api/open/authenticate", self.base_url())
    }

    pub fn graphql_url(&self) -> String {
        format!(
            "{}projects/api/platform/{}/graphql",
            self.base_url(),
            self.platform_id
        )
    }

    /// Check that every connection setting is present
    pub fn validate(&self) -> Result<(), PlatformError> {
        let missing: Vec<&str> = [
            ("url", &self.url),
            ("platform_id", &self.platform_id),
            ("user", &self.user),
            ("password", &self.password),
            ("realm", &self.realm),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlatformError::Config(format!(
                "missing connection settings: {}",
                missing.join(", ")
            )))
        }
    }
}
