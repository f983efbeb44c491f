//! Sequential deployment stage pipeline

use tracing::{debug, error, info};

use crate::errors::DeployError;
use crate::runner::CommandRunner;

/// One ordered step of the deployment pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    /// Human-readable description used in logs and errors
    pub description: String,

    /// External command the stage runs
    pub command: String,
}

impl Stage {
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
        }
    }
}

/// Stage commands for the pre-swap part of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub update_code: String,
    pub install_dependencies: String,
    pub run_migrations: String,
    pub cache_config: String,
    pub cache_routes: String,
    pub cache_views: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            update_code: "git pull origin master".to_string(),
            install_dependencies: "composer install --no-dev --optimize-autoloader".to_string(),
            run_migrations: "php artisan migrate --force".to_string(),
            cache_config: "php artisan config:cache".to_string(),
            cache_routes: "php artisan route:cache".to_string(),
            cache_views: "php artisan view:cache".to_string(),
        }
    }
}

/// Build the fixed pre-swap stage sequence.
///
/// The order is load-bearing: migrations must run against the new code
/// before caches are primed against it, and the container swap happens
/// only after every stage here has succeeded.
pub fn build_stages(options: &PipelineOptions) -> Vec<Stage> {
    vec![
        Stage::new("Updating code from repository", &options.update_code),
        Stage::new("Installing dependencies", &options.install_dependencies),
        Stage::new("Running database migrations", &options.run_migrations),
        Stage::new("Caching configuration", &options.cache_config),
        Stage::new("Caching routes", &options.cache_routes),
        Stage::new("Caching views", &options.cache_views),
    ]
}

/// Run one stage and report its outcome.
///
/// Success logs completion (stdout at debug level); failure logs the
/// captured error output and aborts with a stage error.
pub async fn run_stage(runner: &dyn CommandRunner, stage: &Stage) -> Result<(), DeployError> {
    info!("{}...", stage.description);

    let output = runner.run(&stage.command).await?;

    if !output.success {
        error!("{} failed", stage.description);
        error!("Error output: {}", output.stderr);
        return Err(DeployError::Stage {
            description: stage.description.clone(),
            detail: output.stderr,
        });
    }

    info!("{} completed", stage.description);
    if !output.stdout.is_empty() {
        debug!("Command output: {}", output.stdout);
    }

    Ok(())
}

/// Run stages strictly in sequence, aborting at the first failure.
/// No stage is retried; commands are expected to be idempotent so an
/// operator can re-trigger the whole pipeline.
pub async fn run_pipeline(runner: &dyn CommandRunner, stages: &[Stage]) -> Result<(), DeployError> {
    for stage in stages {
        run_stage(runner, stage).await?;
    }
    Ok(())
}
