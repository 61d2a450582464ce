//! # Server Configuration
//!
//! Application state, router assembly and the OpenAPI document.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::alerts::Alerter;
use crate::config::{AppConfig, DetectionConfig, DetectionConfigHandle};
use crate::ensemble::EnsembleEngine;
use crate::handlers::{self, ModelStatus};

/// Result of the startup warmup pass over the model fleet.
#[derive(Debug, Clone)]
pub struct WarmupReport {
    pub completed: bool,
    pub models: Vec<ModelStatus>,
}

/// Run one inference per enabled model so first requests do not pay
/// initialization cost, recording per-model latency for `/health`.
pub async fn warm_up(engine: &EnsembleEngine, cfg: &DetectionConfig) -> WarmupReport {
    const WARMUP_TEXT: &str = "warmup check, nothing to report";

    let mut models = Vec::new();
    let mut all_ok = true;
    for wrapper in engine.wrappers() {
        let Some(model_cfg) = cfg.models.get(wrapper.model_id()) else {
            continue;
        };
        if !model_cfg.enabled {
            continue;
        }
        let started = Instant::now();
        let status = match wrapper.analyze(WARMUP_TEXT, model_cfg).await {
            Ok(_) => "ready",
            Err(_) => {
                all_ok = false;
                "error"
            }
        };
        models.push(ModelStatus {
            model_id: wrapper.model_id().to_string(),
            status: status.to_string(),
            warmup_latency_ms: started.elapsed().as_millis() as u64,
        });
    }

    info!(models = models.len(), completed = all_ok, "warmup finished");
    WarmupReport {
        completed: all_ok,
        models,
    }
}

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<EnsembleEngine>,
    pub detection: DetectionConfigHandle,
    pub alerter: Arc<Alerter>,
    pub warmup: Arc<WarmupReport>,
}

/// Propagate the caller's correlation id into task-local storage so error
/// payloads can echo it back.
async fn trace_context(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    match trace_id {
        Some(trace_id) => {
            crate::telemetry::with_trace_context(
                crate::telemetry::TraceContext { trace_id },
                next.run(request),
            )
            .await
        }
        None => next.run(request).await,
    }
}

/// Creates and configures the Axum application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/analyze", post(handlers::analyze::analyze))
        .route(
            "/config/context",
            get(handlers::config::get_context_config).put(handlers::config::put_context_config),
        )
        .layer(middleware::from_fn(trace_context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given state.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("invalid server address: {e}"))?;
    let profile = state.config.profile.clone();

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::analyze::analyze,
        crate::handlers::config::get_context_config,
        crate::handlers::config::put_context_config,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::AnalyzeRequest,
            crate::models::AnalyzeResponse,
            crate::models::CrisisAssessment,
            crate::models::ModelSignal,
            crate::models::ConsensusResult,
            crate::models::ConflictResult,
            crate::models::ContextAnalysisResult,
            crate::models::HistoryItem,
            crate::config::DetectionConfig,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::ModelStatus,
        )
    ),
    info(
        title = "Vigil Crisis Detection API",
        description = "Stateless crisis-detection service for community messages",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
