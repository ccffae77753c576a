//! Pipeline graph definition loaded from JSON or YAML

use crate::core::{
    alias::normalize_name_to_alias,
    config::{read_file, ConfigError},
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Alias used when neither the alias nor the name yield a usable one
pub const DEFAULT_PIPELINE_ALIAS: &str = "pipeline";

/// Source format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(DefinitionFormat::Json),
            Some("yaml") | Some("yml") => Ok(DefinitionFormat::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Node names may be written as strings, numbers or booleans
fn scalar_name(value: Value) -> Result<String, String> {
    match value {
        Value::String(name) => Ok(name),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("invalid node name: {}", other)),
    }
}

fn node_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_name(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

/// A missing or `null` list is empty
fn node_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(scalar_name)
        .collect::<Result<_, _>>()
        .map_err(serde::de::Error::custom)
}

/// A job node: runs the job registered under `alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobNodeDef {
    #[serde(deserialize_with = "node_name")]
    pub node: String,
    pub alias: String,
    #[serde(default, deserialize_with = "node_names")]
    pub next_nodes: Vec<String>,
}

/// A condition node branching on the status of the previous nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConditionDef {
    #[serde(deserialize_with = "node_name")]
    pub node: String,
    /// Status value, e.g. `AllSuccess`, `AtLeastOneSuccess`, `AllSuccessOrSkipped`
    pub trigger: String,
    #[serde(default, deserialize_with = "node_names")]
    pub next_nodes_success: Vec<String>,
    #[serde(default, deserialize_with = "node_names")]
    pub next_nodes_failure: Vec<String>,
}

/// A condition node branching on a custom expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionConditionDef {
    #[serde(deserialize_with = "node_name")]
    pub node: String,
    pub expression: String,
    #[serde(default, deserialize_with = "node_names")]
    pub next_nodes_success: Vec<String>,
    #[serde(default, deserialize_with = "node_names")]
    pub next_nodes_failure: Vec<String>,
}

/// One recognized entry of `pipeline.nodes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeDef {
    Job(JobNodeDef),
    ConditionStatus(StatusConditionDef),
    ConditionExpression(ExpressionConditionDef),
}

impl NodeDef {
    /// Name of the node inside the definition
    pub fn name(&self) -> &str {
        match self {
            NodeDef::Job(job) => &job.node,
            NodeDef::ConditionStatus(cond) => &cond.node,
            NodeDef::ConditionExpression(cond) => &cond.node,
        }
    }

    /// Every node name this node points to, success branch first
    pub fn references(&self) -> Vec<&str> {
        match self {
            NodeDef::Job(job) => job.next_nodes.iter().map(String::as_str).collect(),
            NodeDef::ConditionStatus(cond) => cond
                .next_nodes_success
                .iter()
                .chain(&cond.next_nodes_failure)
                .map(String::as_str)
                .collect(),
            NodeDef::ConditionExpression(cond) => cond
                .next_nodes_success
                .iter()
                .chain(&cond.next_nodes_failure)
                .map(String::as_str)
                .collect(),
        }
    }

    /// Parse one raw entry; `Ok(None)` when the entry has no recognized key
    fn from_value(value: &Value) -> Result<Option<Self>, String> {
        fn parse<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, String> {
            serde_json::from_value(value.clone()).map_err(|e| format!("{} node: {}", key, e))
        }

        if let Some(job) = value.get("job") {
            return parse("job", job).map(|def| Some(NodeDef::Job(def)));
        }
        if let Some(cond) = value.get("conditionExpression") {
            return parse("conditionExpression", cond)
                .map(|def| Some(NodeDef::ConditionExpression(def)));
        }
        if let Some(cond) = value.get("conditionStatus") {
            return parse("conditionStatus", cond).map(|def| Some(NodeDef::ConditionStatus(def)));
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    pipeline: RawPipeline,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPipeline {
    name: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    execution_variables: Option<bool>,
    #[serde(default)]
    nodes: Vec<Value>,
}

/// Declarative description of a graph pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    pub name: String,

    pub alias: Option<String>,

    pub description: Option<String>,

    /// Whether execution variables are enabled on the pipeline
    pub execution_variables: Option<bool>,

    /// Recognized nodes, in definition order
    pub nodes: Vec<NodeDef>,

    /// Entries that were skipped because no node kind was recognized
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<Value>,
}

impl PipelineDefinition {
    /// Load a definition, picking JSON or YAML from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = DefinitionFormat::from_path(path)?;
        let content = read_file("pipeline definition", path)?;
        Self::parse(&content, format).map_err(|e| match e {
            ConfigError::Invalid(message) => ConfigError::Parse {
                kind: "pipeline definition",
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::parse(json, DefinitionFormat::Json)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, DefinitionFormat::Yaml)
    }

    fn parse(content: &str, format: DefinitionFormat) -> Result<Self, ConfigError> {
        let raw: RawDefinition = match format {
            DefinitionFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))?
            }
            DefinitionFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))?
            }
        };
        Self::from_raw(raw.pipeline)
    }

    fn from_raw(raw: RawPipeline) -> Result<Self, ConfigError> {
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        let mut unrecognized = Vec::new();

        for (index, value) in raw.nodes.into_iter().enumerate() {
            match NodeDef::from_value(&value) {
                Ok(Some(node)) => nodes.push(node),
                Ok(None) => {
                    warn!(
                        "{} not recognized .... Some error in your pipeline config file",
                        value
                    );
                    unrecognized.push(value);
                }
                Err(message) => {
                    return Err(ConfigError::Invalid(format!(
                        "pipeline.nodes[{}]: {}",
                        index, message
                    )))
                }
            }
        }

        Ok(PipelineDefinition {
            name: raw.name,
            alias: raw.alias.filter(|a| !a.trim().is_empty()),
            description: raw.description.filter(|d| !d.trim().is_empty()),
            execution_variables: raw.execution_variables,
            nodes,
            unrecognized,
        })
    }

    /// Configured alias, or one derived from the pipeline name
    pub fn resolved_alias(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => normalize_name_to_alias(&self.name, DEFAULT_PIPELINE_ALIAS),
        }
    }

    /// Distinct job aliases, in order of first appearance
    pub fn job_aliases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .filter_map(|node| match node {
                NodeDef::Job(job) => Some(job.alias.as_str()),
                _ => None,
            })
            .filter(|alias| seen.insert(*alias))
            .collect()
    }

    pub fn job_node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, NodeDef::Job(_)))
            .count()
    }

    pub fn condition_node_count(&self) -> usize {
        self.nodes.len() - self.job_node_count()
    }

    /// Structural problems that the platform would reject
    ///
    /// Reports duplicate node names and references to nodes that are never
    /// defined. Building the graph does not require a clean report.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut defined = HashSet::new();

        for node in &self.nodes {
            if !defined.insert(node.name()) {
                problems.push(format!("Duplicate node name: {}", node.name()));
            }
        }

        for node in &self.nodes {
            for next in node.references() {
                if !defined.contains(next) {
                    problems.push(format!(
                        "Node '{}' references undefined node '{}'",
                        node.name(),
                        next
                    ));
                }
            }
        }

        problems
    }
}
