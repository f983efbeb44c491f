//! Deployment worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::deploy::orchestrator::Orchestrator;
use crate::deploy::DeploymentRequest;

/// Deployer worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum queued deployment requests before webhooks are rejected
    pub queue_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { queue_capacity: 8 }
    }
}

/// Run the deployer worker.
///
/// Single consumer of the deployment queue: attempts execute strictly one
/// at a time and in arrival order, so overlapping webhooks serialize here.
/// Failures are logged and terminal for the attempt; the webhook caller
/// already received its response and is never notified.
pub async fn run(
    orchestrator: Arc<Orchestrator>,
    mut queue: mpsc::Receiver<DeploymentRequest>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Deployer worker starting...");

    loop {
        let request = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Deployer worker shutting down...");
                return;
            }
            request = queue.recv() => match request {
                Some(request) => request,
                None => {
                    info!("Deployment queue closed, deployer worker stopping...");
                    return;
                }
            }
        };

        match orchestrator.execute(&request).await {
            Ok(_) => {}
            Err(e) => {
                error!(
                    "Deployment failed for commit: {}. Error: {}",
                    request.commit, e
                );
            }
        }
    }
}
