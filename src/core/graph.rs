//! Graph pipeline construction
//!
//! Translates a [`PipelineDefinition`] into the job-node and condition-node
//! lists expected by the platform. Node names used in the definition are
//! replaced by synthetic UUIDs; a name always maps to the same id within one
//! [`NodeIds`] registry, so nodes may reference nodes defined further down.

use crate::core::definition::{NodeDef, PipelineDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors raised while building the graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("No job found for alias '{alias}' (node '{node}')")]
    UnknownJobAlias { node: String, alias: String },
}

/// Reference to a job registered on the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: String,
}

/// A node that runs a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobNode {
    pub id: String,
    pub job: JobRef,
    pub next_nodes: Vec<String>,
}

/// Branching rule of a condition node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Branch on the status of the preceding nodes
    Status { value: String },
    /// Branch on a custom expression
    Custom { expression: String },
}

/// A node that routes to its success or failure branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionNode {
    pub id: String,
    pub next_nodes_success: Vec<String>,
    pub next_nodes_failure: Vec<String>,
    pub condition: Condition,
}

/// Node-and-edge graph sent to the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPipeline {
    pub job_nodes: Vec<JobNode>,
    pub condition_nodes: Vec<ConditionNode>,
}

impl GraphPipeline {
    pub fn node_count(&self) -> usize {
        self.job_nodes.len() + self.condition_nodes.len()
    }
}

/// How synthetic node ids are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIdStrategy {
    /// Fresh UUID v4 per node name
    Random,
    /// UUID v5 of the node name under a fixed namespace
    Deterministic(Uuid),
}

/// Registry from definition node names to synthetic ids
#[derive(Debug, Clone)]
pub struct NodeIds {
    strategy: NodeIdStrategy,
    ids: HashMap<String, String>,
}

impl NodeIds {
    /// Random ids, new on every deployment
    pub fn random() -> Self {
        Self {
            strategy: NodeIdStrategy::Random,
            ids: HashMap::new(),
        }
    }

    /// Ids derived from `seed` and the node name, identical across deployments
    pub fn deterministic(seed: &str) -> Self {
        Self {
            strategy: NodeIdStrategy::Deterministic(Uuid::new_v5(
                &Uuid::NAMESPACE_OID,
                seed.as_bytes(),
            )),
            ids: HashMap::new(),
        }
    }

    pub fn strategy(&self) -> NodeIdStrategy {
        self.strategy
    }

    /// Id of `name`, allocating one on first use
    pub fn id_for(&mut self, name: &str) -> String {
        if let Some(id) = self.ids.get(name) {
            return id.clone();
        }
        let id = match self.strategy {
            NodeIdStrategy::Random => Uuid::new_v4(),
            NodeIdStrategy::Deterministic(namespace) => Uuid::new_v5(&namespace, name.as_bytes()),
        }
        .to_string();
        self.ids.insert(name.to_string(), id.clone());
        id
    }

    /// Allocate ids for a node and every node it references
    pub fn register(&mut self, node: &NodeDef) {
        self.id_for(node.name());
        for next in node.references() {
            self.id_for(next);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn ids_for(&mut self, names: &[String]) -> Vec<String> {
        names.iter().map(|name| self.id_for(name)).collect()
    }
}

/// Canonical spelling of a status trigger
///
/// `ALLSUCCESS`, `all_success_or_skipped` and the like map to the values the
/// platform accepts; anything else is passed through untouched.
pub fn status_trigger(trigger: &str) -> String {
    let key: String = trigger
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_uppercase();
    match key.as_str() {
        "ALLSUCCESS" => "AllSuccess".to_string(),
        "ALLSUCCESSORSKIPPED" => "AllSuccessOrSkipped".to_string(),
        "ATLEASTONESUCCESS" => "AtLeastOneSuccess".to_string(),
        _ => trigger.to_string(),
    }
}

/// Build the platform graph of `definition`
///
/// `job_ids` maps each job alias to the platform job id. Nodes keep the
/// order of the definition; unrecognized entries were already dropped when
/// the definition was loaded.
pub fn build_graph(
    definition: &PipelineDefinition,
    job_ids: &HashMap<String, String>,
    ids: &mut NodeIds,
) -> Result<GraphPipeline, GraphError> {
    let mut graph = GraphPipeline::default();

    debug!("Creating graph pipeline ...");
    for node in &definition.nodes {
        ids.register(node);

        match node {
            NodeDef::Job(job) => {
                let job_id =
                    job_ids
                        .get(&job.alias)
                        .ok_or_else(|| GraphError::UnknownJobAlias {
                            node: job.node.clone(),
                            alias: job.alias.clone(),
                        })?;

                graph.job_nodes.push(JobNode {
                    id: ids.id_for(&job.node),
                    job: JobRef { id: job_id.clone() },
                    next_nodes: ids.ids_for(&job.next_nodes),
                });
            }
            NodeDef::ConditionStatus(cond) => {
                graph.condition_nodes.push(ConditionNode {
                    id: ids.id_for(&cond.node),
                    next_nodes_success: ids.ids_for(&cond.next_nodes_success),
                    next_nodes_failure: ids.ids_for(&cond.next_nodes_failure),
                    condition: Condition::Status {
                        value: status_trigger(&cond.trigger),
                    },
                });
            }
            NodeDef::ConditionExpression(cond) => {
                graph.condition_nodes.push(ConditionNode {
                    id: ids.id_for(&cond.node),
                    next_nodes_success: ids.ids_for(&cond.next_nodes_success),
                    next_nodes_failure: ids.ids_for(&cond.next_nodes_failure),
                    condition: Condition::Custom {
                        expression: cond.expression.clone(),
                    },
                });
            }
        }
    }

    debug!("List of job nodes: {:?}", graph.job_nodes);
    debug!("List of condition nodes: {:?}", graph.condition_nodes);
    Ok(graph)
}
