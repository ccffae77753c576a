//! Platform error and response types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: HTTP {status}: {body}")]
    Authentication { status: u16, body: String },

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Failed to read upload file [{path}]: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PlatformError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        PlatformError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,

    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

/// Raw GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Return `data`, or the joined error messages when the server reported any
    pub fn into_data(self) -> Result<Value, PlatformError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(PlatformError::GraphQl(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| PlatformError::UnexpectedResponse("response has no data".to_string()))
    }
}

/// Deserialize the value found at a JSON pointer of `data`
///
/// A `null` value deserializes into `None` for optional targets.
pub fn extract<T: DeserializeOwned>(data: &Value, pointer: &str) -> Result<T, PlatformError> {
    let value = data.pointer(pointer).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| PlatformError::UnexpectedResponse(format!("{}: {}", pointer, e)))
}

/// A named resource returned by list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub id: String,
    pub name: String,
}

/// Id and version number of a freshly created job or pipeline version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedVersion {
    /// Job or pipeline id
    pub id: String,

    /// Version number, when the platform returned it
    pub number: Option<u32>,
}
