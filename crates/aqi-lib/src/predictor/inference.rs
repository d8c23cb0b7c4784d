//! Dual-model inference over the model registry

use super::output::OutputFormatter;
use super::Predictor;
use crate::error::{AqiError, Result};
use crate::models::{FeatureVector, PredictionResponse};
use crate::observability::ServiceMetrics;
use crate::regressor::Regressor;
use crate::registry::ModelRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inference latency before warning (50ms target)
const MAX_INFERENCE_MS: u128 = 50;

/// Queries both registered models and averages their outputs
pub struct EnsemblePredictor {
    registry: Arc<ModelRegistry>,
    output_formatter: OutputFormatter,
    metrics: ServiceMetrics,
}

impl EnsemblePredictor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            output_formatter: OutputFormatter::new(),
            metrics: ServiceMetrics::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

impl Predictor for EnsemblePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<PredictionResponse> {
        let start = Instant::now();

        if let Some(field) = features.first_non_finite() {
            return Err(AqiError::Validation(format!("{} must be a finite number", field)));
        }

        let (forest, boost) = self.registry.models()?;
        let rf = forest.predict(features)?;
        let ab = boost.predict(features)?;
        let response = self.output_formatter.format(features, rf, ab);

        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), rf, ab, "Inference completed");
        }

        Ok(response)
    }

    fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }
}
