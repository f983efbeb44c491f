//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::logs::LogLevel;

/// Daemon settings, read from a JSON file at startup. The webhook secret
/// is deliberately not part of this file; it comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Webhook configuration
    #[serde(default)]
    pub webhook: WebhookSettings,

    /// Pre-swap pipeline stage commands
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Container swap stage commands
    #[serde(default)]
    pub swap: SwapSettings,

    /// Health poller configuration
    #[serde(default)]
    pub health: HealthSettings,

    /// Maximum queued deployment requests
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            server: ServerSettings::default(),
            webhook: WebhookSettings::default(),
            pipeline: PipelineSettings::default(),
            swap: SwapSettings::default(),
            health: HealthSettings::default(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        let raw = tokio::fs::read(path).await?;
        let settings = serde_json::from_slice(&raw)?;
        Ok(settings)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Only pushes to this ref trigger a deployment
    #[serde(default = "default_target_ref")]
    pub target_ref: String,

    /// Working directory the pipeline commands run in
    #[serde(default = "default_workdir")]
    pub workdir: String,
}

fn default_target_ref() -> String {
    "refs/heads/master".to_string()
}

fn default_workdir() -> String {
    "/var/www/know-api".to_string()
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            target_ref: default_target_ref(),
            workdir: default_workdir(),
        }
    }
}

/// Pre-swap pipeline stage commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_update_code")]
    pub update_code: String,

    #[serde(default = "default_install_dependencies")]
    pub install_dependencies: String,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: String,

    #[serde(default = "default_cache_config")]
    pub cache_config: String,

    #[serde(default = "default_cache_routes")]
    pub cache_routes: String,

    #[serde(default = "default_cache_views")]
    pub cache_views: String,
}

fn default_update_code() -> String {
    "git pull origin master".to_string()
}

fn default_install_dependencies() -> String {
    "composer install --no-dev --optimize-autoloader".to_string()
}

fn default_run_migrations() -> String {
    "php artisan migrate --force".to_string()
}

fn default_cache_config() -> String {
    "php artisan config:cache".to_string()
}

fn default_cache_routes() -> String {
    "php artisan route:cache".to_string()
}

fn default_cache_views() -> String {
    "php artisan view:cache".to_string()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            update_code: default_update_code(),
            install_dependencies: default_install_dependencies(),
            run_migrations: default_run_migrations(),
            cache_config: default_cache_config(),
            cache_routes: default_cache_routes(),
            cache_views: default_cache_views(),
        }
    }
}

/// Container swap stage commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSettings {
    #[serde(default = "default_build_image")]
    pub build_image: String,

    #[serde(default = "default_start_container")]
    pub start_container: String,

    #[serde(default = "default_cleanup")]
    pub cleanup: String,
}

fn default_build_image() -> String {
    "docker-compose build app".to_string()
}

fn default_start_container() -> String {
    "docker-compose up -d --no-deps app".to_string()
}

fn default_cleanup() -> String {
    "docker system prune -f".to_string()
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            build_image: default_build_image(),
            start_container: default_start_container(),
            cleanup: default_cleanup(),
        }
    }
}

/// Health poller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Endpoint the poller probes
    #[serde(default = "default_health_url")]
    pub url: String,

    /// Seconds between attempts
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Hard ceiling on attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_health_url() -> String {
    "http://localhost/health".to_string()
}

fn default_interval_secs() -> u64 {
    2
}

fn default_max_attempts() -> u32 {
    30
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            url: default_health_url(),
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}
