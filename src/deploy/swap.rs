//! Zero-downtime container swap

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::deploy::health::{self, HealthProbe};
use crate::deploy::pipeline::{run_stage, Stage};
use crate::errors::DeployError;
use crate::runner::CommandRunner;

/// Swap stage commands
#[derive(Debug, Clone)]
pub struct SwapOptions {
    pub build_image: String,
    pub start_container: String,
    pub cleanup: String,
}

impl Default for SwapOptions {
    fn default() -> Self {
        Self {
            build_image: "docker-compose build app".to_string(),
            start_container: "docker-compose up -d --no-deps app".to_string(),
            cleanup: "docker system prune -f".to_string(),
        }
    }
}

/// Replace the serving container with a freshly built one.
///
/// The currently-serving container keeps serving throughout. Cleanup of
/// superseded containers runs only after the replacement passes its
/// health check; any earlier failure leaves the old container as the
/// traffic target.
pub async fn swap_containers<S, F>(
    runner: &dyn CommandRunner,
    probe: &dyn HealthProbe,
    options: &SwapOptions,
    health_options: &health::Options,
    sleep_fn: S,
) -> Result<(), DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Starting container swap...");

    run_stage(
        runner,
        &Stage::new("Building updated container image", &options.build_image),
    )
    .await?;

    run_stage(
        runner,
        &Stage::new("Starting new container", &options.start_container),
    )
    .await?;

    health::wait_for_healthy(probe, health_options, sleep_fn).await?;

    run_stage(
        runner,
        &Stage::new("Cleaning up old containers", &options.cleanup),
    )
    .await?;

    info!("Container swap completed successfully");
    Ok(())
}
