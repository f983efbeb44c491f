//! Webhook receiver tests
//!
//! Drives the real router with in-memory requests and observes the
//! deployment queue end, so no orchestration ever runs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use tokio::sync::mpsc;
use tower::ServiceExt;

use deployd::deploy::DeploymentRequest;
use deployd::server::serve::router;
use deployd::server::state::ServerState;
use deployd::webhook::{sign_payload, SIGNATURE_HEADER};

const SECRET: &str = "test-webhook-secret";
const FULL_SHA: &str = "abc123def4567890abc123def4567890abc123de";

fn app(secret: Option<&str>, capacity: usize) -> (Router, mpsc::Receiver<DeploymentRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    let state = ServerState::new(
        tx,
        secret.map(|s| SecretString::from(s.to_string())),
        "refs/heads/master".to_string(),
    );
    let app = router(Arc::new(state)).layer(MockConnectInfo(SocketAddr::from((
        [127, 0, 0, 1],
        4242,
    ))));
    (app, rx)
}

fn push_body(git_ref: &str) -> String {
    format!(r#"{{"ref":"{git_ref}","after":"{FULL_SHA}"}}"#)
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/deploy")
        .header("content-type", "application/json");

    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_missing_signature_is_unauthorized() {
    let (app, mut rx) = app(Some(SECRET), 4);
    let body = push_body("refs/heads/master");

    let response = app.oneshot(webhook_request(&body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Unauthorized");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_bad_signature_is_unauthorized() {
    let (app, mut rx) = app(Some(SECRET), 4);
    let body = push_body("refs/heads/master");
    let signature = sign_payload("some-other-secret", body.as_bytes());

    let response = app
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_secret_rejects_everything() {
    let (app, mut rx) = app(None, 4);
    let body = push_body("refs/heads/master");
    let signature = sign_payload(SECRET, body.as_bytes());

    let response = app
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_non_master_ref_is_ignored() {
    let (app, mut rx) = app(Some(SECRET), 4);
    let body = push_body("refs/heads/feature/search");
    let signature = sign_payload(SECRET, body.as_bytes());

    let response = app
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Ignored - not master branch");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_valid_push_queues_one_deployment() {
    let (app, mut rx) = app(Some(SECRET), 4);
    let body = push_body("refs/heads/master");
    let signature = sign_payload(SECRET, body.as_bytes());

    let response = app
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(payload["status"], "deployment_queued");
    assert_eq!(payload["commit"], "abc123d");

    // Exactly one request, carrying the 7-char commit
    let request = rx.try_recv().unwrap();
    assert_eq!(request.commit, "abc123d");
    assert_eq!(request.git_ref, "refs/heads/master");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_after_defaults_to_unknown() {
    let (app, mut rx) = app(Some(SECRET), 4);
    let body = r#"{"ref":"refs/heads/master"}"#;
    let signature = sign_payload(SECRET, body.as_bytes());

    let response = app
        .oneshot(webhook_request(body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rx.try_recv().unwrap().commit, "unknown");
}

#[tokio::test]
async fn test_saturated_queue_rejects_webhook() {
    let (app, _rx) = app(Some(SECRET), 1);
    let body = push_body("refs/heads/master");
    let signature = sign_payload(SECRET, body.as_bytes());

    let first = app
        .clone()
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Queue capacity is 1 and nothing drains it
    let second = app
        .oneshot(webhook_request(&body, Some(&signature)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);

    let payload: serde_json::Value =
        serde_json::from_str(&body_string(second).await).unwrap();
    assert_eq!(payload["status"], "busy");
}

#[tokio::test]
async fn test_health_endpoint_reports_healthy() {
    let (app, _rx) = app(Some(SECRET), 4);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["service"], "deployd");
}
