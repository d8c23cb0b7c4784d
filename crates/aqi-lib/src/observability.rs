//! Observability infrastructure for the AQI predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, training duration, model and dataset state)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Buckets for model training (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    training_duration_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    models_loaded: IntGauge,
    dataset_records: IntGauge,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "aqi_prediction_latency_seconds",
                "Time spent running both models for one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            training_duration_seconds: register_histogram!(
                "aqi_training_duration_seconds",
                "Time spent fitting both models at startup",
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            predictions_total: register_int_counter!(
                "aqi_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "aqi_prediction_errors_total",
                "Total number of rejected or failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            models_loaded: register_int_gauge!(
                "aqi_models_loaded",
                "1 when both models are ready, 0 otherwise"
            )
            .expect("Failed to register models_loaded"),

            dataset_records: register_int_gauge!(
                "aqi_dataset_records",
                "Number of records in the corpus used for the last training"
            )
            .expect("Failed to register dataset_records"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_training_duration(&self, duration_secs: f64) {
        self.inner().training_duration_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn set_models_loaded(&self, loaded: bool) {
        self.inner().models_loaded.set(i64::from(loaded));
    }

    pub fn set_dataset_records(&self, count: usize) {
        self.inner().dataset_records.set(count as i64);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for startup, model
/// lifecycle, predictions and data collection.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, dataset_path: &str, model_dir: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            dataset_path = %dataset_path,
            model_dir = %model_dir,
            "AQI service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "AQI service shutting down"
        );
    }

    pub fn log_models_loaded(&self, n_records: usize) {
        info!(
            event = "models_loaded",
            service = %self.service,
            n_records = n_records,
            "Loaded persisted models"
        );
    }

    pub fn log_models_trained(&self, n_records: usize, duration_secs: f64) {
        info!(
            event = "models_trained",
            service = %self.service,
            n_records = n_records,
            duration_secs = duration_secs,
            "Trained both models from corpus"
        );
    }

    pub fn log_persist_failed(&self, kind: &str, error: &str) {
        warn!(
            event = "model_persist_failed",
            service = %self.service,
            kind = %kind,
            error = %error,
            "Failed to persist model, serving from memory"
        );
    }

    pub fn log_models_unavailable(&self, reason: &str) {
        warn!(
            event = "models_unavailable",
            service = %self.service,
            reason = %reason,
            "Models unavailable, predictions will be refused"
        );
    }

    pub fn log_prediction(&self, prediction: f64, rf: f64, adaboost: f64, latency_secs: f64) {
        info!(
            event = "prediction_served",
            service = %self.service,
            prediction = prediction,
            rf_prediction = rf,
            adaboost_prediction = adaboost,
            latency_secs = latency_secs,
            "Served AQI prediction"
        );
    }

    pub fn log_collection(&self, requested: usize, collected: usize) {
        if collected == 0 && requested > 0 {
            warn!(
                event = "collection_finished",
                service = %self.service,
                requested = requested,
                collected = collected,
                "No readings collected, check API keys and network"
            );
        } else {
            info!(
                event = "collection_finished",
                service = %self.service,
                requested = requested,
                collected = collected,
                "Collected air quality readings"
            );
        }
    }

    pub fn log_dataset_merge(&self, incoming: usize, total: usize) {
        info!(
            event = "dataset_merged",
            service = %self.service,
            incoming = incoming,
            total = total,
            "Updated training corpus"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_metrics_creation() {
        // Metrics live in the global Prometheus registry; handles share it.
        let metrics = ServiceMetrics::new();
        metrics.observe_prediction_latency(0.001);
        metrics.observe_training_duration(0.5);
        metrics.inc_predictions();
        metrics.inc_prediction_errors();
        metrics.set_models_loaded(true);
        metrics.set_dataset_records(10);

        let again = ServiceMetrics::new();
        again.inc_predictions();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("aqi-server");
        assert_eq!(logger.service, "aqi-server");
    }
}
