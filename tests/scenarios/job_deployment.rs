//! Test: creating and upgrading jobs

use crate::helpers::*;
use saagie_ci::core::{JobConfig, ReleaseInfo};
use saagie_ci::execution::{DeployEvent, DeployOutcome};
use std::path::PathBuf;

fn train_model_job() -> JobConfig {
    JobConfig::from_json(
        r#"{
            "job_name": "train_model",
            "file_path": "./dist/train_model/train_model.zip",
            "description": "Train the sentiment model",
            "category": "Processing",
            "technology": "python",
            "runtime_version": "3.9",
            "command_line": "python __main__.py"
        }"#,
    )
    .unwrap()
}

/// A job that does not exist yet is created with its technology resolved
#[tokio::test]
async fn test_create_missing_job() {
    let platform = MockPlatform::new().with_technology("Saagie", "python", "t-python");
    let (deployer, events) = deployer_with_events(platform);

    let outcome = deployer
        .create_or_upgrade_job(&train_model_job(), &env_with_project_id("p-1"), &ReleaseInfo::default())
        .await
        .unwrap();

    assert!(outcome.is_created());
    assert_eq!(outcome.version().id, "job-train_model");
    assert_eq!(deployer.platform().calls(), vec!["create_job:train_model"]);

    let new_jobs = deployer.platform().new_jobs.lock().unwrap().clone();
    assert_eq!(new_jobs[0].project_id, "p-1");
    assert_eq!(new_jobs[0].technology_id.as_deref(), Some("t-python"));
    assert_eq!(new_jobs[0].category.as_deref(), Some("Processing"));

    let versions = deployer.platform().job_versions.lock().unwrap().clone();
    assert_eq!(versions[0].runtime_version.as_deref(), Some("3.9"));
    assert_eq!(
        versions[0].file,
        Some(PathBuf::from("./dist/train_model/train_model.zip"))
    );

    let events = events.lock().unwrap();
    assert!(matches!(&events[0], DeployEvent::ProjectResolved { project_id } if project_id == "p-1"));
    assert!(matches!(
        events.last(),
        Some(DeployEvent::JobDeployed { job_name, outcome: DeployOutcome::Created(_) }) if job_name == "train_model"
    ));
}

/// The technology is looked up in the configured catalog
#[tokio::test]
async fn test_create_job_with_custom_catalog() {
    let mut job = train_model_job();
    job.technology = Some("spark".to_string());
    job.technology_catalog = Some("Acme".to_string());

    let platform = MockPlatform::new()
        .with_technology("Saagie", "spark", "t-saagie-spark")
        .with_technology("Acme", "spark", "t-acme-spark");
    let (deployer, _) = deployer_with_events(platform);

    deployer
        .create_or_upgrade_job(&job, &env_with_project_id("p-1"), &ReleaseInfo::default())
        .await
        .unwrap();

    let new_jobs = deployer.platform().new_jobs.lock().unwrap().clone();
    assert_eq!(new_jobs[0].technology_id.as_deref(), Some("t-acme-spark"));
}

/// An existing job gets a new version, without any technology lookup
#[tokio::test]
async fn test_upgrade_existing_job() {
    let platform = MockPlatform::new().with_job("p-1", "train_model", "train_model", "job-42");
    let (deployer, _) = deployer_with_events(platform);
    let release = ReleaseInfo {
        release_note: "Tune learning rate".to_string(),
        source_url: "https://gitlab.com/acme/sentiment/-/commit/abc".to_string(),
    };

    let outcome = deployer
        .create_or_upgrade_job(&train_model_job(), &env_with_project_id("p-1"), &release)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Upgraded(saagie_ci::platform::DeployedVersion {
            id: "job-42".to_string(),
            number: Some(2),
        })
    );
    assert_eq!(deployer.platform().calls(), vec!["upgrade_job:job-42"]);

    let edited = deployer.platform().edited_jobs.lock().unwrap().clone();
    assert_eq!(edited[0].0, "job-42");
    assert!(edited[0].1.technology_id.is_none());

    let versions = deployer.platform().job_versions.lock().unwrap().clone();
    assert_eq!(versions[0].release_note, "Tune learning rate");
    assert_eq!(
        versions[0].source_url,
        "https://gitlab.com/acme/sentiment/-/commit/abc"
    );
}

/// The project is looked up by name when the environment has no project id
#[tokio::test]
async fn test_project_resolved_by_name() {
    let platform = MockPlatform::new()
        .with_project("Sentiment", "p-7")
        .with_technology("Saagie", "python", "t-python");
    let (deployer, _) = deployer_with_events(platform);

    deployer
        .create_or_upgrade_job(&train_model_job(), &env_with_project_name("Sentiment"), &ReleaseInfo::default())
        .await
        .unwrap();

    let new_jobs = deployer.platform().new_jobs.lock().unwrap().clone();
    assert_eq!(new_jobs[0].project_id, "p-7");
}

#[tokio::test]
async fn test_unknown_project_fails() {
    let (deployer, _) = deployer_with_events(MockPlatform::new());

    let err = deployer
        .create_or_upgrade_job(&train_model_job(), &env_with_project_name("Nope"), &ReleaseInfo::default())
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Nope"));
    assert!(deployer.platform().calls().is_empty());
}

#[tokio::test]
async fn test_unknown_technology_fails() {
    let (deployer, _) = deployer_with_events(MockPlatform::new());

    let err = deployer
        .create_or_upgrade_job(&train_model_job(), &env_with_project_id("p-1"), &ReleaseInfo::default())
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("python"));
    assert!(deployer.platform().calls().is_empty());
}

fn nightly_job() -> JobConfig {
    JobConfig::from_json(
        r#"{
            "job_name": "nightly_etl",
            "technology": "python",
            "emails": ["data@acme.io"],
            "status_list": ["FAILED"],
            "env": {
                "prod": {"is_scheduled": true, "cron_scheduling": "0 2 * * *"}
            }
        }"#,
    )
    .unwrap()
}

/// Scheduling follows the environment the job is deployed to
#[tokio::test]
async fn test_schedule_selected_by_environment() {
    let platform = MockPlatform::new().with_technology("Saagie", "python", "t-python");
    let (deployer, _) = deployer_with_events(platform);
    let job = nightly_job();

    deployer
        .create_or_upgrade_job(&job, &named_env("dev", "p-1"), &ReleaseInfo::default())
        .await
        .unwrap();
    deployer
        .create_or_upgrade_job(&job, &named_env("prod", "p-2"), &ReleaseInfo::default())
        .await
        .unwrap();

    let new_jobs = deployer.platform().new_jobs.lock().unwrap().clone();
    assert!(!new_jobs[0].schedule.is_scheduled());
    assert!(new_jobs[0].schedule.has_alerting());
    assert!(new_jobs[1].schedule.is_scheduled());
    assert_eq!(new_jobs[1].schedule.cron_scheduling.as_deref(), Some("0 2 * * *"));
}

/// Schedule updates reach existing jobs too
#[tokio::test]
async fn test_upgrade_edits_schedule() {
    let platform = MockPlatform::new().with_job("p-2", "nightly_etl", "nightly_etl", "job-9");
    let (deployer, _) = deployer_with_events(platform);

    deployer
        .create_or_upgrade_job(&nightly_job(), &named_env("prod", "p-2"), &ReleaseInfo::default())
        .await
        .unwrap();

    let edited = deployer.platform().edited_jobs.lock().unwrap().clone();
    assert_eq!(edited.len(), 1);
    assert!(edited[0].1.schedule.is_scheduled());
    assert_eq!(edited[0].1.to_edition("job-9")["cronScheduling"], "0 2 * * *");
}

/// An invalid schedule stops before anything is sent to the platform
#[tokio::test]
async fn test_invalid_schedule_fails_before_deploying() {
    let job = JobConfig::from_json(
        r#"{"job_name": "etl", "env": {"prod": {"is_scheduled": true}}}"#,
    )
    .unwrap();
    let platform = MockPlatform::new().with_job("p-1", "etl", "etl", "job-1");
    let (deployer, _) = deployer_with_events(platform);

    let err = deployer
        .create_or_upgrade_job(&job, &named_env("prod", "p-1"), &ReleaseInfo::default())
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("cron_scheduling"));
    assert!(deployer.platform().calls().is_empty());
}
