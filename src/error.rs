//! # Error Handling
//!
//! Unified error handling for the vigil API: a consistent problem+json
//! response shape with trace ID propagation, plus the pipeline's internal
//! error kinds. Component-local recovery is the default; only unrecoverable
//! conditions (invalid input, no models at all, deadline) reach the caller.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry::current_trace_id;

/// Unified API error response structure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable message safe to display to operators
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ApiError {
    /// Create a new API error with the given status code and message.
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            trace_id: current_trace_id(),
        }
    }

    /// Add details to the error.
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );
        (self.status, headers, axum::Json(self)).into_response()
    }
}

/// Create a validation error with field details.
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

/// One specific model failed to produce a signal. Non-fatal: the engine
/// drops the model's weight from the denominator and carries on.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("model '{model_id}' unavailable: {reason}")]
    ModelUnavailable { model_id: String, reason: String },
}

impl ClassifierError {
    pub fn model_id(&self) -> &str {
        match self {
            ClassifierError::ModelUnavailable { model_id, .. } => model_id,
        }
    }
}

/// Unrecoverable ensemble failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no models are enabled")]
    NoModelsEnabled,
    #[error("all models failed to produce a signal")]
    AllModelsUnavailable { failures: Vec<String> },
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoModelsEnabled => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "ALL_MODELS_UNAVAILABLE",
                "no models are enabled",
            ),
            EngineError::AllModelsUnavailable { ref failures } => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "ALL_MODELS_UNAVAILABLE",
                "every model failed to produce a signal",
            )
            .with_details(json!({ "failures": failures })),
        }
    }
}

/// The request exceeded its overall deadline; partial results are discarded.
pub fn deadline_exceeded(deadline_secs: u64) -> ApiError {
    ApiError::new(
        StatusCode::GATEWAY_TIMEOUT,
        "DEADLINE_EXCEEDED".to_string(),
        format!("request exceeded the {deadline_secs}s deadline"),
    )
}

/// A runtime configuration update was rejected.
pub fn configuration_error(message: String) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "CONFIGURATION_ERROR".to_string(),
        message,
    )
}
