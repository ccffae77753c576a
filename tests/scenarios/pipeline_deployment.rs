//! Test: building and deploying graph pipelines

use crate::helpers::*;
use saagie_ci::core::{Condition, ReleaseInfo};
use saagie_ci::execution::{DeployEvent, NodeIdMode};

/// A new pipeline is created with a graph pointing at the platform jobs
#[tokio::test]
async fn test_create_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.yaml", TRAINING_PIPELINE);
    let (deployer, _) = deployer_with_events(training_platform());

    let outcome = deployer
        .create_or_upgrade_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap();

    assert!(outcome.is_created());
    assert_eq!(deployer.platform().calls(), vec!["create_pipeline:Sentiment training"]);

    let graphs = deployer.platform().graphs.lock().unwrap().clone();
    let (pipeline, graph) = &graphs[0];
    assert_eq!(pipeline.project_id, "p-1");
    assert_eq!(pipeline.alias, "Sentiment_training");
    assert_eq!(pipeline.release_note, "WIP");
    assert_eq!(
        pipeline.description.as_deref(),
        Some("Prepare data, train and clean up")
    );

    assert_eq!(graph.job_nodes.len(), 3);
    assert_eq!(graph.condition_nodes.len(), 1);

    let job_ids: Vec<&str> = graph.job_nodes.iter().map(|n| n.job.id.as_str()).collect();
    assert_eq!(job_ids, vec!["job-prep", "job-train", "job-clean"]);

    let check = &graph.condition_nodes[0];
    assert_eq!(graph.job_nodes[0].next_nodes, vec![check.id.clone()]);
    assert_eq!(check.next_nodes_success, vec![graph.job_nodes[1].id.clone()]);
    assert_eq!(check.next_nodes_failure, vec![graph.job_nodes[2].id.clone()]);
    assert_eq!(
        check.condition,
        Condition::Status {
            value: "AllSuccess".to_string()
        }
    );
}

/// An existing pipeline receives a new graph version
#[tokio::test]
async fn test_upgrade_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.yml", TRAINING_PIPELINE);
    let platform = training_platform().with_pipeline("p-1", "Sentiment training", "pl-1");
    let (deployer, events) = deployer_with_events(platform);

    let outcome = deployer
        .create_or_upgrade_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap();

    assert!(!outcome.is_created());
    assert_eq!(outcome.version().id, "pl-1");
    assert_eq!(deployer.platform().calls(), vec!["upgrade_pipeline:pl-1"]);

    let events = events.lock().unwrap();
    let aliases = events
        .iter()
        .filter(|e| matches!(e, DeployEvent::JobAliasResolved { .. }))
        .count();
    assert_eq!(aliases, 3);
    assert!(events.iter().any(|e| matches!(
        e,
        DeployEvent::GraphBuilt { job_nodes: 3, condition_nodes: 1, .. }
    )));
    assert!(matches!(events.last(), Some(DeployEvent::PipelineDeployed { .. })));
}

/// A job alias missing on the platform aborts before anything is deployed
#[tokio::test]
async fn test_unknown_job_alias_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.yaml", TRAINING_PIPELINE);
    let platform = MockPlatform::new()
        .with_job("p-1", "Data preparation", "data_preparation", "job-prep")
        .with_job("p-1", "Train model", "train_model", "job-train");
    let (deployer, _) = deployer_with_events(platform);

    let err = deployer
        .create_or_upgrade_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("clean_data"));
    assert!(deployer.platform().calls().is_empty());
}

/// Stable node ids survive redeployments, random ones do not
#[tokio::test]
async fn test_node_id_modes() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.yaml", TRAINING_PIPELINE);
    let env = env_with_project_id("p-1");
    let release = ReleaseInfo::default();
    let (deployer, _) = deployer_with_events(training_platform());

    let first = deployer
        .plan_pipeline(&config, &env, &release, NodeIdMode::Stable)
        .await
        .unwrap();
    let second = deployer
        .plan_pipeline(&config, &env, &release, NodeIdMode::Stable)
        .await
        .unwrap();
    assert_eq!(first.graph, second.graph);

    let random = deployer
        .plan_pipeline(&config, &env, &release, NodeIdMode::Random)
        .await
        .unwrap();
    assert_ne!(first.graph.job_nodes[0].id, random.graph.job_nodes[0].id);
    assert_eq!(first.graph.job_nodes[0].job, random.graph.job_nodes[0].job);
}

/// Planning resolves everything but deploys nothing
#[tokio::test]
async fn test_plan_is_a_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.yaml", TRAINING_PIPELINE);
    let platform = training_platform().with_pipeline("p-1", "Sentiment training", "pl-1");
    let (deployer, _) = deployer_with_events(platform);

    let plan = deployer
        .plan_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap();

    assert_eq!(plan.existing_id.as_deref(), Some("pl-1"));
    assert!(deployer.platform().calls().is_empty());

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["existingId"], "pl-1");
    assert_eq!(json["alias"], "Sentiment_training");
    assert_eq!(json["graph"]["jobNodes"].as_array().unwrap().len(), 3);
}

/// JSON definitions carry alias and execution variables; unknown entries are skipped
#[tokio::test]
async fn test_json_definition_with_expression_and_unknown_entry() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(
        dir.path(),
        "gated.json",
        r#"{
            "pipeline": {
                "name": "Gated training",
                "alias": "gated",
                "executionVariables": true,
                "nodes": [
                    {"job": {"node": "train", "alias": "train_model", "nextNodes": ["gate"]}},
                    {"conditionExpression": {
                        "node": "gate",
                        "expression": "tonumber(vars.ACCURACY) > 0.9",
                        "nextNodesFailure": ["cleanup"]
                    }},
                    {"notify": {"node": "mail"}},
                    {"job": {"node": "cleanup", "alias": "clean_data"}}
                ]
            }
        }"#,
    );
    let (deployer, _) = deployer_with_events(training_platform());

    deployer
        .create_or_upgrade_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap();

    let graphs = deployer.platform().graphs.lock().unwrap().clone();
    let (pipeline, graph) = &graphs[0];
    assert_eq!(pipeline.alias, "gated");
    assert_eq!(pipeline.has_execution_variables_enabled, Some(true));
    assert_eq!(graph.node_count(), 3);

    let gate = &graph.condition_nodes[0];
    assert!(gate.next_nodes_success.is_empty());
    assert_eq!(gate.next_nodes_failure, vec![graph.job_nodes[1].id.clone()]);
    assert_eq!(
        gate.condition,
        Condition::Custom {
            expression: "tonumber(vars.ACCURACY) > 0.9".to_string()
        }
    );
}

#[tokio::test]
async fn test_unsupported_definition_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path(), "training.txt", TRAINING_PIPELINE);
    let (deployer, _) = deployer_with_events(training_platform());

    let err = deployer
        .create_or_upgrade_pipeline(
            &config,
            &env_with_project_id("p-1"),
            &ReleaseInfo::default(),
            NodeIdMode::Random,
        )
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("json or yaml"));
}
