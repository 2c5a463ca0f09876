//! HTTP API: model selection, manual and batch prediction, health and
//! Prometheus metrics

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use prometheus::{Encoder, TextEncoder};
use rainfall_lib::{
    batch::{predict_dataset, write_full_results, write_results, BatchDataset},
    health::{ComponentStatus, HealthRegistry},
    observability::{PredictionMetrics, StructuredLogger},
    predictor::{predict_manual, ArtifactRegistry, ArtifactStatus, ModelVariant, Predictor},
    Category, FeatureRecord, ManualPrediction, PredictionRow,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: ArtifactRegistry,
    pub health_registry: HealthRegistry,
    pub metrics: PredictionMetrics,
    pub logger: StructuredLogger,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        registry: ArtifactRegistry,
        health_registry: HealthRegistry,
        metrics: PredictionMetrics,
        logger: StructuredLogger,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            registry,
            health_registry,
            metrics,
            logger,
            max_upload_bytes,
        }
    }

    /// Load the requested artifact; failure ends the request
    fn load_model(&self, variant: ModelVariant) -> Result<Box<dyn Predictor>, AppError> {
        self.registry.load(variant).map_err(|e| {
            self.metrics.inc_artifact_load_failure(variant);
            self.logger.log_artifact_failure(variant, &e.to_string());
            AppError::from(e)
        })
    }
}

fn parse_variant(model: Option<&str>) -> Result<ModelVariant, AppError> {
    match model {
        Some(name) => Ok(name.parse()?),
        None => Ok(ModelVariant::Baseline),
    }
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ArtifactStatus>,
}

/// Available models with their reported evaluation scores
async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        models: state.registry.status(),
    })
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub features: FeatureRecord,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub model: ModelVariant,
    pub model_version: String,
    #[serde(flatten)]
    pub result: ManualPrediction,
}

/// Predict one manually entered record
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let variant = parse_variant(request.model.as_deref())?;
    if let Err(e) = request.features.validate() {
        state.metrics.inc_invalid_input("manual");
        return Err(e.into());
    }

    let start = Instant::now();
    let model = state.load_model(variant)?;
    let result = predict_manual(model.as_ref(), &request.features, request.date)
        .map_err(AppError::from_prediction)?;
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_prediction(variant, result.category);
    state
        .logger
        .log_prediction(variant, model.model_version(), result.prediction, result.category);

    Ok(Json(PredictResponse {
        model: variant,
        model_version: model.model_version().to_string(),
        result,
    }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub format: BatchFormat,
    /// Include every input column in CSV exports
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub model: ModelVariant,
    pub model_version: String,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_column: Option<&'static str>,
    pub rows: Vec<PredictionRow>,
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Batch prediction from a raw semicolon-delimited body or a multipart
/// upload with a `file` field
async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchQuery>,
    request: Request,
) -> Result<Response, AppError> {
    if !is_multipart(&request) {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
        return run_batch(&state, &query, &body);
    }

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let data = field.bytes().await?;
            debug!(bytes = data.len(), "Received batch upload");
            return run_batch(&state, &query, &data);
        }
    }
    Err(AppError::Upload("multipart form has no 'file' field".to_string()))
}

fn run_batch(state: &AppState, query: &BatchQuery, body: &[u8]) -> Result<Response, AppError> {
    let variant = parse_variant(query.model.as_deref())?;
    let dataset = BatchDataset::from_reader(body).map_err(|e| {
        state.metrics.inc_invalid_input("batch");
        AppError::from(e)
    })?;

    let start = Instant::now();
    let model = state.load_model(variant)?;
    let rows = predict_dataset(model.as_ref(), &dataset).map_err(AppError::from_prediction)?;
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    state.metrics.record_batch(variant, rows.len());
    for row in &rows {
        state.metrics.inc_prediction(variant, row.category);
    }
    let extreme_rows = rows.iter().filter(|r| r.category == Category::Extreme).count();
    state
        .logger
        .log_batch(variant, model.model_version(), rows.len(), extreme_rows);

    match query.format {
        BatchFormat::Json => Ok(Json(BatchResponse {
            model: variant,
            model_version: model.model_version().to_string(),
            total: rows.len(),
            date_column: dataset
                .has_date_column()
                .then_some(rainfall_lib::DATE_COLUMN),
            rows,
        })
        .into_response()),
        BatchFormat::Csv => {
            let mut buffer = Vec::new();
            if query.full {
                write_full_results(&mut buffer, &dataset, &rows)?;
            } else {
                write_results(&mut buffer, &dataset, &rows)?;
            }
            let disposition = format!("attachment; filename=\"{}\"", variant.export_file_name());
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                buffer,
            )
                .into_response())
        }
    }
}

/// Health check response - returns 200 if operational, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.health_registry.refresh_artifacts(&state.registry).await;
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.health_registry.refresh_artifacts(&state.registry).await;
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return AppError::Internal(anyhow::anyhow!("failed to encode metrics: {}", e))
            .into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .route("/api/v1/models", get(list_models))
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/predict/batch", post(predict_batch))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting dashboard API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
