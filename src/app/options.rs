//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::health;
use crate::deploy::pipeline::PipelineOptions;
use crate::deploy::swap::SwapOptions;
use crate::workers::deployer;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Webhook configuration
    pub webhook: WebhookOptions,

    /// Pre-swap pipeline stage commands
    pub pipeline: PipelineOptions,

    /// Container swap stage commands
    pub swap: SwapOptions,

    /// Health poller configuration
    pub health: health::Options,

    /// Deployer worker options
    pub deployer: deployer::Options,
}

/// Lifecycle options for the daemon
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

/// Webhook options
#[derive(Debug, Clone)]
pub struct WebhookOptions {
    /// Only pushes to this ref trigger a deployment
    pub target_ref: String,

    /// Working directory the pipeline commands run in
    pub workdir: PathBuf,
}

impl Default for WebhookOptions {
    fn default() -> Self {
        Self {
            target_ref: "refs/heads/master".to_string(),
            workdir: PathBuf::from("/var/www/know-api"),
        }
    }
}
