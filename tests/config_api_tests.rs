//! Tests for the runtime configuration endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{get, post_json, put_json, test_app};

#[tokio::test]
async fn get_returns_the_default_configuration() {
    let (_state, app) = test_app().await;
    let (status, body) = get(&app, "/config/context").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thresholds"]["critical"], 0.85);
    assert_eq!(body["context"]["max_history_size"], 20);
    assert_eq!(body["consensus"]["default_algorithm"], "weighted_voting");
    assert_eq!(body["models"]["crisis"]["enabled"], true);
}

#[tokio::test]
async fn put_swaps_the_snapshot_atomically() {
    let (_state, app) = test_app().await;
    let (_, mut config) = get(&app, "/config/context").await;

    config["alerts"]["crisis_cooldown_secs"] = json!(5);
    config["context"]["max_history_size"] = json!(10);

    let (status, updated) = put_json(&app, "/config/context", config).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["alerts"]["crisis_cooldown_secs"], 5);

    let (_, fetched) = get(&app, "/config/context").await;
    assert_eq!(fetched["alerts"]["crisis_cooldown_secs"], 5);
    assert_eq!(fetched["context"]["max_history_size"], 10);
}

#[tokio::test]
async fn invalid_update_is_rejected_and_snapshot_kept() {
    let (_state, app) = test_app().await;
    let (_, mut config) = get(&app, "/config/context").await;

    // Thresholds out of order.
    config["thresholds"]["low"] = json!(0.95);
    let (status, body) = put_json(&app, "/config/context", config).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");

    let (_, fetched) = get(&app, "/config/context").await;
    assert_eq!(fetched["thresholds"]["low"], 0.2);
}

#[tokio::test]
async fn disabling_every_model_is_rejected() {
    let (_state, app) = test_app().await;
    let (_, mut config) = get(&app, "/config/context").await;

    for model in ["crisis", "sentiment", "emotion", "irony"] {
        config["models"][model]["enabled"] = json!(false);
    }
    let (status, body) = put_json(&app, "/config/context", config).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("at least one model")
    );
}

#[tokio::test]
async fn malformed_update_is_a_validation_error() {
    let (_state, app) = test_app().await;
    let (status, body) = put_json(&app, "/config/context", json!({ "thresholds": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn updated_thresholds_change_analyze_results() {
    let (_state, app) = test_app().await;

    // Baseline: this message lands in the medium band.
    let message = json!({ "message": "I feel so alone and everything hurts" });
    let (_, before) = post_json(&app, "/analyze", message.clone()).await;
    assert_eq!(before["severity"], "medium");

    // Raise the medium floor above the score; the same message drops to low.
    let (_, mut config) = get(&app, "/config/context").await;
    config["thresholds"]["medium"] = json!(0.60);
    let (status, _) = put_json(&app, "/config/context", config).await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = post_json(&app, "/analyze", message).await;
    assert_eq!(after["severity"], "low");
}
