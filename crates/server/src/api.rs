//! HTTP API for predictions, health checks and Prometheus metrics

use aqi_lib::{
    health::{HealthResponse, ReadinessResponse},
    observability::{ServiceMetrics, StructuredLogger},
    AqiError, EnsemblePredictor, FeatureVector, Predictor,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<EnsemblePredictor>,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(predictor: Arc<EnsemblePredictor>, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            predictor,
            metrics,
            logger,
        }
    }
}

/// Prediction request body. Absent or null fields count as 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub ozone: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl PredictRequest {
    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(
            self.co.unwrap_or(0.0),
            self.ozone.unwrap_or(0.0),
            self.no2.unwrap_or(0.0),
            self.pm25.unwrap_or(0.0),
            self.lat.unwrap_or(0.0),
            self.lng.unwrap_or(0.0),
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Request failure mapped onto an HTTP status
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AqiError> for ApiError {
    fn from(err: AqiError) -> Self {
        let status = match &err {
            AqiError::Validation(_) => StatusCode::BAD_REQUEST,
            AqiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Combined AQI estimate from both models
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();

    let result = payload
        .map_err(ApiError::from)
        .and_then(|Json(request)| state.predictor.predict(&request.features()).map_err(ApiError::from));

    match result {
        Ok(response) => {
            state.metrics.inc_predictions();
            state.logger.log_prediction(
                response.prediction,
                response.rf_prediction,
                response.adaboost_prediction,
                start.elapsed().as_secs_f64(),
            );
            Ok(Json(response))
        }
        Err(err) => {
            state.metrics.inc_prediction_errors();
            warn!(status = err.status.as_u16(), error = %err.message, "Prediction request failed");
            Err(err)
        }
    }
}

/// Liveness - always 200 while the process runs
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse::from_registry(state.predictor.registry()))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = ReadinessResponse::from_registry(state.predictor.registry());

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
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn serve(
    host: &str,
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let request: PredictRequest = serde_json::from_str(r#"{"co": 1.5, "lat": null}"#).unwrap();
        let features = request.features();
        assert_eq!(features.co, 1.5);
        assert_eq!(features.lat, 0.0);
        assert_eq!(features.pm25, 0.0);
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        assert!(serde_json::from_str::<PredictRequest>(r#"{"co": "abc"}"#).is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        let err = ApiError::from(AqiError::ModelUnavailable("empty".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(AqiError::Validation("bad".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(AqiError::Training("boom".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
