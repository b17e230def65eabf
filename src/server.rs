//! HTTP transport: routes, request logging and response mapping.

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::health::HealthReporter;
use crate::inference::InferenceHandler;
use crate::metrics::{Endpoint, MetricsRegistry};
use crate::models::holder::ModelHolder;
use crate::types::request::PredictionRequest;
use crate::types::response::{HealthResponse, PredictionResponse, ServiceDescriptor};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Endpoints advertised by `GET /`.
pub const ENDPOINTS: [&str; 4] = ["/predict", "/health", "/ready", "/metrics"];

/// Process-wide state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHolder>,
    pub metrics: Arc<MetricsRegistry>,
    inference: InferenceHandler,
    health: HealthReporter,
}

impl AppState {
    /// Wrap a holder whose `load` has already run.
    pub fn new(model: ModelHolder, metrics: Arc<MetricsRegistry>) -> Self {
        let model = Arc::new(model);
        Self {
            inference: InferenceHandler::new(model.clone(), metrics.clone()),
            health: HealthReporter::new(model.clone(), metrics.clone()),
            model,
            metrics,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Bind the listener. `host` may be an IP literal or a resolvable name.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!(address = %listener.local_addr()?, "Listening");
    Ok(listener)
}

/// Logs method, path, status and duration around every request.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration = format!("{:.3}s", start.elapsed().as_secs_f64()),
        "Request handled"
    );
    response
}

async fn root() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor::new(&ENDPOINTS))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.health())
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.health.readiness() {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(e) => (e.status_code(), Json(state.health.snapshot("not_ready"))),
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Json(request) =
        payload.map_err(|rejection| state.inference.reject_malformed(rejection.body_text()))?;

    // Model scoring is blocking work
    let handler = state.inference.clone();
    let result = tokio::task::spawn_blocking(move || {
        handler.handle(&request.features, request.request_id)
    })
    .await
    .map_err(|e| {
        state.metrics.record_failure(Endpoint::Predict);
        ServiceError::Internal(e.to_string())
    })??;

    Ok(Json(result.into()))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to export metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
