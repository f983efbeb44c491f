//! Error types for deployd

use thiserror::Error;

/// Main error type for the deployment daemon
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),

    /// A pipeline command reported non-success. Carries the stage
    /// description and the captured error output.
    #[error("{description} failed: {detail}")]
    Stage { description: String, detail: String },

    /// The replacement container never became healthy. Distinct from a
    /// stage failure so the swap abort path is identifiable in logs.
    #[error("Health check timeout - new container failed to become healthy after {attempts} attempts")]
    HealthTimeout { attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DeployError {
    fn from(err: anyhow::Error) -> Self {
        DeployError::Internal(err.to_string())
    }
}
