//! HTTP API: the prediction endpoint plus health checks and metrics

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{
    health::{ComponentStatus, HealthRegistry},
    models::{RawObservation, ValidationError},
    observability::{MonitorMetrics, StructuredLogger},
    pipeline::HealthPipeline,
    store::{VerdictKey, VerdictStore, ANONYMOUS_USER},
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<HealthPipeline>,
    pub health_registry: HealthRegistry,
    pub metrics: MonitorMetrics,
    pub logger: StructuredLogger,
    pub store: Option<Arc<dyn VerdictStore>>,
    pub app_namespace: String,
}

impl AppState {
    pub fn new(
        pipeline: Arc<HealthPipeline>,
        health_registry: HealthRegistry,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
        store: Option<Arc<dyn VerdictStore>>,
        app_namespace: String,
    ) -> Self {
        Self {
            pipeline,
            health_registry,
            metrics,
            logger,
            store,
            app_namespace,
        }
    }
}

/// Prediction endpoint: raw vitals in, consolidated verdict out
async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(json) => json,
        Err(_) => {
            state.metrics.inc_validation_failures();
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Request must be JSON" })),
            )
                .into_response();
        }
    };

    let observation = match RawObservation::from_value(&payload) {
        Ok(obs) => obs,
        Err(ValidationError::MissingFields(missing)) => {
            state.metrics.inc_validation_failures();
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing features in input", "missing": missing })),
            )
                .into_response();
        }
        Err(ValidationError::NotAnObject) => {
            state.metrics.inc_validation_failures();
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Request must be JSON" })),
            )
                .into_response();
        }
    };

    let start = Instant::now();
    let verdict = match state.pipeline.assess(&observation) {
        Ok(verdict) => verdict,
        Err(err) => {
            error!(error = %err, "Prediction pipeline failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Prediction failed" })),
            )
                .into_response();
        }
    };
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    let cattle_id = observation.cattle_id.as_deref();
    state.logger.log_verdict(
        cattle_id.unwrap_or("Unknown"),
        &verdict.health_status.to_string(),
        &verdict.risk_level.to_string(),
        verdict.confidence_pct,
        verdict.diseases.len(),
        verdict.alerts.len(),
    );

    let document = verdict.into_document(cattle_id, payload);

    // Fire-and-forget persistence; failures are logged and swallowed
    if let Some(store) = &state.store {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS_USER)
            .to_string();
        let key = VerdictKey::new(
            state.app_namespace.clone(),
            user_id,
            document.cattle_id.clone(),
        );
        let store = store.clone();
        let metrics = state.metrics.clone();
        let logger = state.logger.clone();
        let doc_value = serde_json::to_value(&document).unwrap_or(Value::Null);
        tokio::spawn(async move {
            if let Err(err) = store.upsert(&key, &doc_value).await {
                metrics.inc_persistence_errors();
                logger.log_persistence_failure(&key.cattle_id, &err.to_string());
            }
        });
    }

    (StatusCode::OK, Json(document)).into_response()
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
