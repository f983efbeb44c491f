//! HTTP request handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{info, warn};

use crate::deploy::DeploymentRequest;
use crate::server::state::ServerState;
use crate::utils::version_info;
use crate::webhook::{short_commit, verify_signature, PushEvent, SIGNATURE_HEADER};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler; this is the endpoint the swap poller probes on
/// the replacement container
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deployd".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Webhook acceptance response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub commit: String,
    pub message: String,
}

/// GitHub deployment webhook handler.
///
/// Verifies the payload signature, filters by target ref, enqueues a
/// deployment request, and responds immediately. The response never waits
/// for the deployment itself.
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let verified = match (&state.webhook_secret, signature) {
        (Some(secret), Some(signature)) => {
            verify_signature(secret.expose_secret(), &body, signature)
        }
        _ => false,
    };

    if !verified {
        warn!("Invalid webhook signature from IP: {}", addr.ip());
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    // A body without a usable ref falls through to the ignored branch,
    // same as a push to any non-target ref
    let event: PushEvent = serde_json::from_slice(&body).unwrap_or_default();

    if event.git_ref != state.target_ref {
        info!("Ignoring push to branch: {}", event.git_ref);
        return (StatusCode::OK, "Ignored - not master branch").into_response();
    }

    let commit = short_commit(&event.after);
    info!("Starting deployment for commit: {}", commit);

    let request = DeploymentRequest {
        commit: commit.clone(),
        git_ref: event.git_ref,
    };

    // Queue the deployment to avoid timing out the webhook caller
    if let Err(e) = state.deploy_queue.try_send(request) {
        warn!("Deployment queue is saturated, rejecting webhook: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(WebhookResponse {
                status: "busy".to_string(),
                commit,
                message: "A deployment is already in progress".to_string(),
            }),
        )
            .into_response();
    }

    Json(WebhookResponse {
        status: "deployment_queued".to_string(),
        commit,
        message: "Deployment started successfully".to_string(),
    })
    .into_response()
}
