//! Configuration endpoint handlers.
//!
//! `GET /config/context` returns the current detection-config snapshot;
//! `PUT /config/context` validates and atomically publishes a replacement.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde_json::json;
use tracing::info;

use crate::config::DetectionConfig;
use crate::error::{ApiError, configuration_error, validation_error};
use crate::server::AppState;

/// Read the active detection configuration.
#[utoipa::path(
    get,
    path = "/config/context",
    responses(
        (status = 200, description = "Current detection configuration", body = DetectionConfig)
    ),
    tag = "configuration"
)]
pub async fn get_context_config(State(state): State<AppState>) -> Json<DetectionConfig> {
    Json((*state.detection.snapshot()).clone())
}

/// Replace the detection configuration.
///
/// The update is validated first and swapped in atomically; in-flight
/// requests keep the snapshot they started with.
#[utoipa::path(
    put,
    path = "/config/context",
    request_body = DetectionConfig,
    responses(
        (status = 200, description = "Configuration updated", body = DetectionConfig),
        (status = 400, description = "Rejected configuration", body = ApiError)
    ),
    tag = "configuration"
)]
pub async fn put_context_config(
    State(state): State<AppState>,
    body: Result<Json<DetectionConfig>, JsonRejection>,
) -> Result<Json<DetectionConfig>, ApiError> {
    let Json(config) = body.map_err(|rejection| {
        validation_error(
            "invalid configuration body",
            json!({ "body": rejection.body_text() }),
        )
    })?;

    state
        .detection
        .update(config)
        .map_err(|err| configuration_error(err.to_string()))?;

    info!("detection configuration updated");
    Ok(Json((*state.detection.snapshot()).clone()))
}
