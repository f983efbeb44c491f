//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::deploy::health::HttpProbe;
use crate::deploy::orchestrator::Orchestrator;
use crate::errors::DeployError;
use crate::runner::ShellRunner;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::deployer;

/// Run the deployment daemon
pub async fn run(
    options: AppOptions,
    webhook_secret: Option<SecretString>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    info!("Initializing deployd...");

    if webhook_secret.is_none() {
        warn!("No webhook secret configured; all webhook requests will be rejected");
    }

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(options.lifecycle.clone());

    if let Err(e) = init(
        &options,
        webhook_secret,
        shutdown_tx.clone(),
        &mut shutdown_manager,
    )
    .await
    {
        error!("Failed to start daemon: {}", e);
        shutdown_manager.shutdown(shutdown_tx).await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    shutdown_manager.shutdown(shutdown_tx).await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    webhook_secret: Option<SecretString>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), DeployError> {
    // Bounded queue: overlapping webhooks serialize behind the single
    // deployer worker, and saturation is rejected at the receiver
    let (deploy_tx, deploy_rx) = mpsc::channel(options.deployer.queue_capacity);

    let runner = Arc::new(ShellRunner::new(&options.webhook.workdir));
    let probe = Arc::new(HttpProbe::new(&options.health.url));
    let orchestrator = Arc::new(Orchestrator::new(
        runner,
        probe,
        options.pipeline.clone(),
        options.swap.clone(),
        options.health.clone(),
    ));

    init_deployer_worker(
        orchestrator,
        deploy_rx,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_server(
        options,
        deploy_tx,
        webhook_secret,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    Ok(())
}

fn init_deployer_worker(
    orchestrator: Arc<Orchestrator>,
    deploy_rx: mpsc::Receiver<crate::deploy::DeploymentRequest>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing deployer worker...");

    let deployer_handle = tokio::spawn(async move {
        deployer::run(
            orchestrator,
            deploy_rx,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_deployer_worker_handle(deployer_handle)?;
    Ok(())
}

async fn init_server(
    options: &AppOptions,
    deploy_tx: mpsc::Sender<crate::deploy::DeploymentRequest>,
    webhook_secret: Option<SecretString>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(
        deploy_tx,
        webhook_secret,
        options.webhook.target_ref.clone(),
    );

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), DeployError>>>,
    deployer_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(lifecycle_options: LifecycleOptions) -> Self {
        Self {
            lifecycle_options,
            server_handle: None,
            deployer_worker_handle: None,
        }
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), DeployError>>,
    ) -> Result<(), DeployError> {
        if self.server_handle.is_some() {
            return Err(DeployError::Shutdown("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub fn with_deployer_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), DeployError> {
        if self.deployer_worker_handle.is_some() {
            return Err(DeployError::Shutdown(
                "deployer_handle already set".to_string(),
            ));
        }
        self.deployer_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(
        &mut self,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Result<(), DeployError> {
        let _ = shutdown_tx.send(());
        drop(shutdown_tx);

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DeployError> {
        info!("Shutting down deployd...");

        // 1. Server, so no new deployments are accepted
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| DeployError::Shutdown(e.to_string()))??;
        }

        // 2. Deployer worker; a mid-flight attempt runs to completion or
        //    is cut off by the shutdown delay ceiling above
        if let Some(handle) = self.deployer_worker_handle.take() {
            handle
                .await
                .map_err(|e| DeployError::Shutdown(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
