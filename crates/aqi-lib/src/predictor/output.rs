//! Prediction output formatting
//!
//! Combines the two raw model outputs and rounds them for presentation.
//! All arithmetic happens at full precision before rounding.

use crate::models::{FeatureVector, PredictionResponse};

/// Decimal places used in prediction payloads
pub const DISPLAY_DECIMALS: i32 = 2;

/// Round half away from zero to [`DISPLAY_DECIMALS`] places
pub fn round_for_display(value: f64) -> f64 {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    (value * scale).round() / scale
}

/// Formats raw model outputs into a PredictionResponse
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Unweighted mean of both models, then rounding.
    ///
    /// No clamping to the 0-500 AQI scale is applied.
    pub fn format(&self, features: &FeatureVector, rf: f64, adaboost: f64) -> PredictionResponse {
        let combined = (rf + adaboost) / 2.0;

        PredictionResponse {
            prediction: round_for_display(combined),
            rf_prediction: round_for_display(rf),
            adaboost_prediction: round_for_display(adaboost),
            inputs: (*features).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::new(1.0, 10.0, 5.0, 11.0, 10.0, 5.0)
    }

    #[test]
    fn test_round_for_display() {
        assert_eq!(round_for_display(46.9649), 46.96);
        assert_eq!(round_for_display(46.965_1), 46.97);
        assert_eq!(round_for_display(-3.14159), -3.14);
        assert_eq!(round_for_display(50.0), 50.0);
    }

    #[test]
    fn test_mean_computed_before_rounding() {
        let formatter = OutputFormatter::new();
        let out = formatter.format(&features(), 10.004, 10.004);

        // Rounded mean of raw values, not mean of rounded values
        assert_eq!(out.prediction, 10.0);
        assert_eq!(out.rf_prediction, 10.0);

        let out = formatter.format(&features(), 1.006, 1.006);
        assert_eq!(out.prediction, 1.01);
    }

    #[test]
    fn test_no_clamping_outside_aqi_scale() {
        let formatter = OutputFormatter::new();
        let out = formatter.format(&features(), 700.0, 650.0);
        assert_eq!(out.prediction, 675.0);

        let out = formatter.format(&features(), -20.0, 0.0);
        assert_eq!(out.prediction, -10.0);
    }

    #[test]
    fn test_inputs_echoed() {
        let out = OutputFormatter::new().format(&features(), 1.0, 2.0);
        assert_eq!(out.inputs.pm25, 11.0);
        assert_eq!(out.inputs.lng, 5.0);
        assert_eq!(out.prediction, 1.5);
    }
}
