//! Server state

use secrecy::SecretString;
use tokio::sync::mpsc;

use crate::deploy::DeploymentRequest;

/// Server state shared across handlers
pub struct ServerState {
    /// Producer side of the deployment queue
    pub deploy_queue: mpsc::Sender<DeploymentRequest>,

    /// Shared secret for webhook signature verification. `None` when not
    /// configured, in which case every webhook is rejected.
    pub webhook_secret: Option<SecretString>,

    /// Only pushes to this ref trigger a deployment
    pub target_ref: String,
}

impl ServerState {
    pub fn new(
        deploy_queue: mpsc::Sender<DeploymentRequest>,
        webhook_secret: Option<SecretString>,
        target_ref: String,
    ) -> Self {
        Self {
            deploy_queue,
            webhook_secret,
            target_ref,
        }
    }
}
