//! # Analyze Endpoint Handler
//!
//! `POST /analyze`: validates the request, runs the ensemble, layers on
//! context analysis and the explanation, shapes the response, and hands the
//! finished assessment to the alerter (fire-and-forget).

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use chrono::Utc;
use chrono_tz::Tz;
use metrics::{counter, histogram};
use serde_json::json;
use tracing::warn;

use crate::alerts::AlertMeta;
use crate::context::{self, CurrentMessage};
use crate::error::{ApiError, deadline_exceeded, validation_error};
use crate::explain;
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, MAX_MESSAGE_CHARS, RecommendedAction,
};
use crate::server::AppState;

/// Analyze one message for crisis indicators.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Crisis assessment", body = AnalyzeResponse),
        (status = 400, description = "Validation failure", body = ApiError),
        (status = 503, description = "No models available", body = ApiError),
        (status = 504, description = "Deadline exceeded", body = ApiError)
    ),
    tag = "analyze"
)]
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        validation_error(
            "invalid request body",
            json!({ "body": rejection.body_text() }),
        )
    })?;

    let started = Instant::now();
    counter!("vigil_analyze_requests_total").increment(1);

    let deadline = Duration::from_secs(state.config.request_deadline_secs);
    let result = tokio::time::timeout(deadline, run_pipeline(&state, request)).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    histogram!("vigil_analyze_latency_ms").record(elapsed_ms as f64);

    match result {
        Ok(Ok(mut response)) => {
            response.processing_time_ms = elapsed_ms;
            Ok(Json(response))
        }
        Ok(Err(err)) => Err(err),
        Err(_) => {
            counter!("vigil_analyze_deadline_exceeded_total").increment(1);
            Err(deadline_exceeded(state.config.request_deadline_secs))
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    request: AnalyzeRequest,
) -> Result<AnalyzeResponse, ApiError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(validation_error(
            "message must not be empty",
            json!({ "message": "required, non-empty after trimming" }),
        ));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(validation_error(
            "message too long",
            json!({
                "message": format!("at most {MAX_MESSAGE_CHARS} characters"),
                "length": message.chars().count(),
            }),
        ));
    }

    let mut warnings = Vec::new();

    // Invalid timezones are ignored with a warning; temporal features fall
    // back to UTC.
    let tz: Tz = match request.user_timezone.as_deref() {
        None => chrono_tz::UTC,
        Some(name) => match name.parse() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(timezone = name, "unrecognized timezone; falling back to UTC");
                warnings.push(format!("unrecognized timezone '{name}'; using UTC"));
                chrono_tz::UTC
            }
        },
    };

    // One config snapshot for the whole request.
    let cfg = state.detection.snapshot();
    let algorithm = request
        .consensus_algorithm
        .unwrap_or(cfg.consensus.default_algorithm);

    let outcome = match state.engine.assess(&message, &cfg, algorithm).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // Tell the operators that the whole ensemble is down.
            if let crate::error::EngineError::AllModelsUnavailable { ref failures } = err {
                let alerter = state.alerter.clone();
                let alerts_cfg = cfg.alerts.clone();
                let failures = failures.clone();
                tokio::spawn(async move {
                    alerter.system_unavailable(&failures, &alerts_cfg).await;
                });
            }
            return Err(err.into());
        }
    };
    let mut assessment = outcome.assessment;
    warnings.extend(outcome.warnings);

    if request.wants_context() && cfg.context.enabled {
        let current = CurrentMessage {
            score: assessment.crisis_score,
            severity: assessment.severity,
            at: Utc::now(),
        };
        let (context_result, context_warnings) = context::analyze(
            &state.engine,
            &request.message_history,
            current,
            tz,
            &cfg,
        )
        .await;
        warnings.extend(context_warnings);

        // Context analysis owns the final urgency once history is in play.
        assessment.intervention_urgency = context_result.intervention_urgency;
        assessment.requires_intervention = context_result.intervention_urgency
            >= crate::models::InterventionUrgency::Standard;
        assessment.recommended_action =
            RecommendedAction::for_urgency(context_result.intervention_urgency);
        assessment.context_analysis = Some(context_result);
    }

    if request.include_explanation {
        assessment.explanation = Some(explain::build(&assessment, request.verbosity));
    }

    // Alerting is best-effort and must never block the response.
    let alerter = state.alerter.clone();
    let alerts_cfg = cfg.alerts.clone();
    let meta = AlertMeta {
        user_id: request.user_id.clone(),
        channel_id: request.channel_id.clone(),
    };
    let observed = assessment.clone();
    tokio::spawn(async move {
        alerter.observe(&observed, &meta, &alerts_cfg).await;
    });

    Ok(AnalyzeResponse {
        assessment,
        processing_time_ms: 0, // stamped by the outer handler
        warnings,
    })
}
