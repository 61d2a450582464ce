//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use url::Url;
use vigil::alerts::{Alert, Alerter};
use vigil::config::{AppConfig, DetectionConfig, DetectionConfigHandle};
use vigil::ensemble::EnsembleEngine;
use vigil::server::{self, AppState};

/// Build an app state over the default model fleet.
///
/// `webhook` of `None` with `testing = true` records alerts in the
/// suppression queue, which the tests inspect.
pub async fn test_state(webhook: Option<Url>, testing: bool) -> AppState {
    test_state_with_engine(EnsembleEngine::new(), webhook, testing).await
}

pub async fn test_state_with_engine(
    engine: EnsembleEngine,
    webhook: Option<Url>,
    testing: bool,
) -> AppState {
    let config = AppConfig {
        profile: "test".to_string(),
        testing_mode: testing,
        ..Default::default()
    };
    let detection = DetectionConfig::default();
    let engine = Arc::new(engine);
    let warmup = server::warm_up(&engine, &detection).await;

    AppState {
        config: Arc::new(config),
        engine,
        detection: DetectionConfigHandle::new(detection),
        alerter: Arc::new(Alerter::new(webhook, testing)),
        warmup: Arc::new(warmup),
    }
}

pub async fn test_app() -> (AppState, Router) {
    let state = test_state(None, true).await;
    let app = server::create_app(state.clone());
    (state, app)
}

/// POST a JSON body and return the status plus parsed response body.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Wait until the alerter's testing queue holds at least `count` alerts.
/// Alerts are dispatched from spawned tasks, so give them a moment.
pub async fn wait_for_alerts(alerter: &Alerter, count: usize) -> Vec<Alert> {
    let mut collected = Vec::new();
    for _ in 0..100 {
        collected.extend(alerter.drain_queue());
        if collected.len() >= count {
            return collected;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    collected
}

/// Give spawned alert tasks time to run, then assert nothing was queued.
pub async fn assert_no_alerts(alerter: &Alerter) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(alerter.drain_queue().is_empty(), "expected no alerts");
}
