//! Deployment module

pub mod health;
pub mod orchestrator;
pub mod pipeline;
pub mod swap;

/// One deployment attempt, created from an accepted webhook event.
/// Immutable; lives only until the attempt finishes.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Shortened (7-char) commit SHA
    pub commit: String,

    /// Git ref that triggered the deployment
    pub git_ref: String,
}
