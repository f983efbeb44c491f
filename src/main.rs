//! deployd - Entry Point
//!
//! A webhook-driven deployment daemon for the Know API. Listens for signed
//! GitHub push events and performs a zero-downtime container swap.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{error, info, warn};

use deployd::app::options::{AppOptions, ServerOptions, WebhookOptions};
use deployd::app::run::run;
use deployd::deploy::health;
use deployd::deploy::pipeline::PipelineOptions;
use deployd::deploy::swap::SwapOptions;
use deployd::logs::{init_logging, LogOptions};
use deployd::settings::Settings;
use deployd::utils::version_info;
use deployd::workers::deployer;

/// Environment variable holding the webhook shared secret
const WEBHOOK_SECRET_ENV: &str = "DEPLOYD_WEBHOOK_SECRET";

/// Default settings file location
const DEFAULT_SETTINGS_PATH: &str = "/etc/deployd/settings.json";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Retrieve the settings file; defaults apply when it is absent
    let settings_path = cli_args
        .get("settings")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let settings = match Settings::load(&settings_path).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "Unable to read settings file {}: {}; using defaults",
                settings_path.display(),
                e
            );
            Settings::default()
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // The shared secret must come from process configuration
    let webhook_secret = match env::var(WEBHOOK_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => Some(SecretString::from(secret)),
        _ => {
            warn!("{} is not set", WEBHOOK_SECRET_ENV);
            None
        }
    };

    let options = AppOptions {
        server: ServerOptions {
            host: settings.server.host.clone(),
            port: settings.server.port,
        },
        webhook: WebhookOptions {
            target_ref: settings.webhook.target_ref.clone(),
            workdir: PathBuf::from(&settings.webhook.workdir),
        },
        pipeline: PipelineOptions {
            update_code: settings.pipeline.update_code.clone(),
            install_dependencies: settings.pipeline.install_dependencies.clone(),
            run_migrations: settings.pipeline.run_migrations.clone(),
            cache_config: settings.pipeline.cache_config.clone(),
            cache_routes: settings.pipeline.cache_routes.clone(),
            cache_views: settings.pipeline.cache_views.clone(),
        },
        swap: SwapOptions {
            build_image: settings.swap.build_image.clone(),
            start_container: settings.swap.start_container.clone(),
            cleanup: settings.swap.cleanup.clone(),
        },
        health: health::Options {
            url: settings.health.url.clone(),
            interval: Duration::from_secs(settings.health.interval_secs),
            max_attempts: settings.health.max_attempts,
        },
        deployer: deployer::Options {
            queue_capacity: settings.queue_capacity,
        },
        ..Default::default()
    };

    info!("Running deployd with options: {:?}", options);
    let result = run(options, webhook_secret, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the daemon: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
