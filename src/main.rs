use anyhow::{Context, Result};
use saagie_ci::cli::commands::{
    PackageJobCommand, RunJobCommand, RunPipelineCommand, UpdateJobCommand,
    UpdatePipelineCommand, ValidateCommand, WaitArgs,
};
use saagie_ci::cli::output::*;
use saagie_ci::cli::validate::validate_definition;
use saagie_ci::cli::{Cli, Command};
use saagie_ci::core::{EnvConfig, JobConfig, PipelineConfig, ReleaseInfo};
use saagie_ci::execution::{Deployer, InstanceKind};
use saagie_ci::platform::SaagieClient;
use saagie_ci::{packaging, InstanceInfo};
use indicatif::ProgressBar;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging, RUST_LOG wins over --debug
    let default_filter = if cli.debug {
        "saagie_ci=debug,warn"
    } else {
        "saagie_ci=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let result = match &cli.command {
        Command::PackageJob(cmd) => package_job(cmd, &cli),
        Command::UpdateJob(cmd) => update_job(cmd, &cli).await,
        Command::RunJob(cmd) => run_job(cmd, &cli).await,
        Command::UpdatePipeline(cmd) => update_pipeline(cmd, &cli).await,
        Command::RunPipeline(cmd) => run_pipeline(cmd, &cli).await,
        Command::Validate(cmd) => validate_pipeline(cmd),
    };

    match result {
        Ok(()) => {
            info!("DONE");
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            println!("{} {}", CROSS, style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn load_env(cli: &Cli) -> Result<EnvConfig> {
    EnvConfig::load(&cli.paths.env_config_dir, &cli.saagie_env)
        .with_context(|| format!("Failed to load environment [{}]", cli.saagie_env))
}

/// Authenticate and build a deployer printing its events
async fn connect(cli: &Cli, env: &EnvConfig, spinner: ProgressBar) -> Result<Deployer<SaagieClient>> {
    let config = cli.connection.platform_config(&env.platform_id);
    let client = SaagieClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.base_url()))?;

    Ok(Deployer::new(client).with_event_handler(move |event| {
        let line = format_deploy_event(event);
        spinner.suspend(|| println!("{}", line));
    }))
}

fn package_job(cmd: &PackageJobCommand, cli: &Cli) -> Result<()> {
    let job = JobConfig::load(&cli.paths.job_config_dir, &cmd.job_name)?;
    match packaging::package_job(
        &job,
        &cmd.job_name,
        &cli.paths.job_source_dir,
        &cli.paths.artefact_dir,
    )? {
        Some(archive) => println!(
            "{} Packaged {} into {}",
            CHECK,
            style(&cmd.job_name).bold(),
            style(archive.display()).dim()
        ),
        None => println!(
            "{} Job {} has no artifact to package",
            INFO,
            style(&cmd.job_name).bold()
        ),
    }
    Ok(())
}

async fn update_job(cmd: &UpdateJobCommand, cli: &Cli) -> Result<()> {
    let env = load_env(cli)?;
    let job = JobConfig::load(&cli.paths.job_config_dir, &cmd.job_name)?;
    let release = ReleaseInfo::from_env()?;

    let deployer = connect(cli, &env, ProgressBar::hidden()).await?;
    deployer.create_or_upgrade_job(&job, &env, &release).await?;
    Ok(())
}

async fn run_job(cmd: &RunJobCommand, cli: &Cli) -> Result<()> {
    let env = load_env(cli)?;
    let job = JobConfig::load(&cli.paths.job_config_dir, &cmd.job_name)?;

    let spinner = create_spinner();
    let deployer = connect(cli, &env, spinner.clone()).await?;
    let instance = deployer.run_job(&job, &env).await?;

    wait_if_requested(&deployer, InstanceKind::Job, instance, &cmd.wait, &spinner).await
}

async fn update_pipeline(cmd: &UpdatePipelineCommand, cli: &Cli) -> Result<()> {
    let env = load_env(cli)?;
    let config = PipelineConfig::load(&cli.paths.pipeline_config_dir, &cmd.pipeline_name)?;
    let release = ReleaseInfo::from_env()?;

    let deployer = connect(cli, &env, ProgressBar::hidden()).await?;
    if cmd.dry_run {
        let plan = deployer
            .plan_pipeline(&config, &env, &release, cmd.node_id_mode())
            .await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    deployer
        .create_or_upgrade_pipeline(&config, &env, &release, cmd.node_id_mode())
        .await?;
    Ok(())
}

async fn run_pipeline(cmd: &RunPipelineCommand, cli: &Cli) -> Result<()> {
    let env = load_env(cli)?;
    let config = PipelineConfig::load(&cli.paths.pipeline_config_dir, &cmd.pipeline_name)?;

    let spinner = create_spinner();
    let deployer = connect(cli, &env, spinner.clone()).await?;
    let instance = deployer.run_pipeline(&config, &env).await?;

    wait_if_requested(&deployer, InstanceKind::Pipeline, instance, &cmd.wait, &spinner).await
}

async fn wait_if_requested(
    deployer: &Deployer<SaagieClient>,
    kind: InstanceKind,
    instance: InstanceInfo,
    wait: &WaitArgs,
    spinner: &ProgressBar,
) -> Result<()> {
    if !wait.wait {
        return Ok(());
    }

    start_spinner(spinner, format!("Waiting for {} instance {}", kind, instance.id));
    let finished = deployer
        .wait_for_instance(kind, instance, wait.options())
        .await;
    spinner.finish_and_clear();

    let finished = finished?;
    if !finished.status.is_success() {
        anyhow::bail!(
            "{} instance [{}] finished with status {}",
            kind,
            finished.id,
            finished.status
        );
    }
    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline definition...", INFO);

    let definition = validate_definition(&cmd.file)?;
    println!("  Name: {}", style(&definition.name).bold());
    println!("  Alias: {}", style(definition.resolved_alias()).cyan());
    println!("  Job nodes: {}", style(definition.job_node_count()).cyan());
    println!(
        "  Condition nodes: {}",
        style(definition.condition_node_count()).cyan()
    );
    println!("  Jobs: {}", definition.job_aliases().join(", "));

    for entry in &definition.unrecognized {
        println!("{} Skipped unrecognized node: {}", WARN, style(entry).dim());
    }

    if cmd.json {
        let json = serde_json::to_string_pretty(&definition)?;
        println!("\n{}", json);
    }

    println!("{} Pipeline definition is valid!", CHECK);
    Ok(())
}
