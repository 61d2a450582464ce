//! # API Handlers
//!
//! HTTP endpoint handlers for the vigil service.

pub mod analyze;
pub mod config;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ServiceInfo;
use crate::server::AppState;

/// Root handler that returns basic service information.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root(State(_state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Per-model readiness as observed during warmup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelStatus {
    pub model_id: String,
    /// "ready" or "error".
    pub status: String,
    /// Warmup inference latency for this model.
    pub warmup_latency_ms: u64,
}

/// Readiness object for `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// Loaded models and their warmup status.
    pub models: Vec<ModelStatus>,
    pub warmup_completed: bool,
    /// True when the alerter records alerts instead of sending them.
    pub alerter_testing_mode: bool,
}

/// Health check endpoint (public, no auth required).
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service readiness", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let warmup = &state.warmup;
    Json(HealthResponse {
        status: if warmup.completed { "ok" } else { "degraded" }.to_string(),
        service: "vigil".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: warmup.models.clone(),
        warmup_completed: warmup.completed,
        alerter_testing_mode: state.alerter.testing_mode(),
    })
}
