//! Health poller unit tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deployd::deploy::health::{wait_for_healthy, HealthProbe, Options};
use deployd::deploy::swap::{swap_containers, SwapOptions};
use deployd::errors::DeployError;
use deployd::runner::{CommandOutput, CommandRunner};

/// Probe that becomes healthy on a given attempt (0 = never)
struct ScriptedProbe {
    healthy_on: u32,
    attempts: AtomicU32,
}

impl ScriptedProbe {
    fn healthy_on(attempt: u32) -> Self {
        Self {
            healthy_on: attempt,
            attempts: AtomicU32::new(0),
        }
    }

    fn never_healthy() -> Self {
        Self::healthy_on(0)
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.healthy_on != 0 && attempt >= self.healthy_on
    }
}

/// Runner that records commands and always succeeds
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, DeployError> {
        self.calls.lock().unwrap().push(command.to_string());
        Ok(CommandOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Sleep function that records requested durations and returns immediately
fn recording_sleep(
    sleeps: Arc<Mutex<Vec<Duration>>>,
) -> impl Fn(Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    move |duration| {
        let sleeps = sleeps.clone();
        Box::pin(async move {
            sleeps.lock().unwrap().push(duration);
        })
    }
}

#[tokio::test]
async fn test_poller_times_out_after_thirty_attempts() {
    let probe = ScriptedProbe::never_healthy();
    let sleeps = Arc::new(Mutex::new(Vec::new()));
    let options = Options::default();

    let err = wait_for_healthy(&probe, &options, recording_sleep(sleeps.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::HealthTimeout { attempts: 30 }));
    assert_eq!(probe.attempts(), 30);

    // One sleep between each pair of attempts, all at the fixed interval
    let sleeps = sleeps.lock().unwrap();
    assert_eq!(sleeps.len(), 29);
    assert!(sleeps.iter().all(|d| *d == Duration::from_secs(2)));
}

#[tokio::test]
async fn test_poller_short_circuits_on_success() {
    let probe = ScriptedProbe::healthy_on(3);
    let sleeps = Arc::new(Mutex::new(Vec::new()));
    let options = Options::default();

    wait_for_healthy(&probe, &options, recording_sleep(sleeps.clone()))
        .await
        .unwrap();

    assert_eq!(probe.attempts(), 3);
    assert_eq!(sleeps.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_poller_succeeds_immediately_without_sleeping() {
    let probe = ScriptedProbe::healthy_on(1);
    let sleeps = Arc::new(Mutex::new(Vec::new()));
    let options = Options::default();

    wait_for_healthy(&probe, &options, recording_sleep(sleeps.clone()))
        .await
        .unwrap();

    assert_eq!(probe.attempts(), 1);
    assert!(sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_swap_runs_cleanup_exactly_once_after_health_success() {
    let runner = RecordingRunner::new();
    let probe = ScriptedProbe::healthy_on(3);
    let sleeps = Arc::new(Mutex::new(Vec::new()));

    swap_containers(
        &runner,
        &probe,
        &SwapOptions::default(),
        &Options::default(),
        recording_sleep(sleeps),
    )
    .await
    .unwrap();

    let calls = runner.calls();
    assert_eq!(
        calls,
        vec![
            "docker-compose build app",
            "docker-compose up -d --no-deps app",
            "docker system prune -f",
        ]
    );
    assert_eq!(probe.attempts(), 3);
}

#[tokio::test]
async fn test_swap_never_cleans_up_on_health_timeout() {
    let runner = RecordingRunner::new();
    let probe = ScriptedProbe::never_healthy();
    let sleeps = Arc::new(Mutex::new(Vec::new()));

    let err = swap_containers(
        &runner,
        &probe,
        &SwapOptions::default(),
        &Options::default(),
        recording_sleep(sleeps),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::HealthTimeout { .. }));

    // The old container stays the traffic target: no prune ran
    let calls = runner.calls();
    assert_eq!(
        calls,
        vec![
            "docker-compose build app",
            "docker-compose up -d --no-deps app",
        ]
    );
}
