//! Ensemble prediction engine

mod inference;
mod output;

pub use inference::EnsemblePredictor;
pub use output::{round_for_display, OutputFormatter, DISPLAY_DECIMALS};

use crate::error::Result;
use crate::models::{FeatureVector, PredictionResponse};

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    /// Produce a combined AQI estimate for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<PredictionResponse>;

    /// Whether predictions can currently be served
    fn is_ready(&self) -> bool;
}
