//! Container health polling

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::DeployError;

/// Health polling options
#[derive(Debug, Clone)]
pub struct Options {
    /// Endpoint the poller probes
    pub url: String,

    /// Wait between attempts
    pub interval: Duration,

    /// Hard ceiling on attempts; the poller always terminates
    pub max_attempts: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: "http://localhost/health".to_string(),
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Liveness probe for a newly started container
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns true when the probe target answered successfully
    async fn probe(&self) -> bool;
}

/// Probe over HTTP; any 2xx response counts as healthy
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Poll until the probe reports healthy, sleeping `interval` between
/// attempts. Gives up with a timeout error after `max_attempts` failed
/// probes; the caller must then leave the old container serving.
pub async fn wait_for_healthy<S, F>(
    probe: &dyn HealthProbe,
    options: &Options,
    sleep_fn: S,
) -> Result<(), DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Waiting for new container to be healthy...");

    for attempt in 1..=options.max_attempts {
        if probe.probe().await {
            info!("New container is healthy after {} attempt(s)", attempt);
            return Ok(());
        }

        debug!(
            "Health check attempt {}/{} failed",
            attempt, options.max_attempts
        );

        if attempt < options.max_attempts {
            sleep_fn(options.interval).await;
        }
    }

    Err(DeployError::HealthTimeout {
        attempts: options.max_attempts,
    })
}
