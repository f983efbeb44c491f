//! Deployment orchestrator

use std::sync::Arc;

use tracing::info;

use crate::deploy::health::{self, HealthProbe};
use crate::deploy::pipeline::{self, PipelineOptions};
use crate::deploy::swap::{self, SwapOptions};
use crate::deploy::DeploymentRequest;
use crate::errors::DeployError;
use crate::runner::CommandRunner;

/// Runs the full deployment sequence for one request: the pre-swap stage
/// pipeline, then the health-gated container swap. Both collaborators are
/// injected so tests never touch a real shell or network.
pub struct Orchestrator {
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn HealthProbe>,
    pipeline: PipelineOptions,
    swap: SwapOptions,
    health: health::Options,
}

impl Orchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn HealthProbe>,
        pipeline: PipelineOptions,
        swap: SwapOptions,
        health: health::Options,
    ) -> Self {
        Self {
            runner,
            probe,
            pipeline,
            swap,
            health,
        }
    }

    /// Execute one deployment attempt.
    ///
    /// Stages run strictly in sequence; the first failure aborts the
    /// attempt and propagates so the worker records it as failed. There
    /// is no automatic retry or rollback.
    pub async fn execute(&self, request: &DeploymentRequest) -> Result<(), DeployError> {
        info!(
            "Starting container swap deployment for commit: {}",
            request.commit
        );

        let stages = pipeline::build_stages(&self.pipeline);
        pipeline::run_pipeline(self.runner.as_ref(), &stages).await?;

        swap::swap_containers(
            self.runner.as_ref(),
            self.probe.as_ref(),
            &self.swap,
            &self.health,
            tokio::time::sleep,
        )
        .await?;

        info!(
            "Deployment completed successfully for commit: {}",
            request.commit
        );
        Ok(())
    }
}
