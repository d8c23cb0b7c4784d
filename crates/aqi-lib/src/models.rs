//! Core data models for the AQI predictor

use serde::{Deserialize, Serialize};

/// Number of input features expected by both models
pub const NUM_FEATURES: usize = 6;

/// Feature column names in model input order.
///
/// Both regressors are trained and queried with exactly this ordering;
/// persisted artifacts record it and are rejected on load if it differs.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "CO AQI Value",
    "Ozone AQI Value",
    "NO2 AQI Value",
    "PM2.5 AQI Value",
    "lat",
    "lng",
];

/// Label column of the training corpus
pub const LABEL_COLUMN: &str = "AQI Value";

/// Feature vector for ML inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub co: f64,
    pub ozone: f64,
    pub no2: f64,
    pub pm25: f64,
    pub lat: f64,
    pub lng: f64,
}

impl FeatureVector {
    pub fn new(co: f64, ozone: f64, no2: f64, pm25: f64, lat: f64, lng: f64) -> Self {
        Self {
            co,
            ozone,
            no2,
            pm25,
            lat,
            lng,
        }
    }

    /// Model input row, ordered as [`FEATURE_COLUMNS`]
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [self.co, self.ozone, self.no2, self.pm25, self.lat, self.lng]
    }

    /// Name of the first non-finite field, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        FEATURE_COLUMNS
            .iter()
            .zip(self.to_row())
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
    }
}

/// One row of the training corpus.
///
/// Field renames match the corpus CSV header. `timestamp` and `source` are
/// bookkeeping columns written by the collector and never used as features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(rename = "AQI Value")]
    pub aqi: f64,
    #[serde(rename = "CO AQI Value")]
    pub co: f64,
    #[serde(rename = "Ozone AQI Value")]
    pub ozone: f64,
    #[serde(rename = "NO2 AQI Value")]
    pub no2: f64,
    #[serde(rename = "PM2.5 AQI Value")]
    pub pm25: f64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl TrainingRecord {
    pub fn new(features: FeatureVector, aqi: f64) -> Self {
        Self {
            aqi,
            co: features.co,
            ozone: features.ozone,
            no2: features.no2,
            pm25: features.pm25,
            lat: features.lat,
            lng: features.lng,
            timestamp: None,
            source: None,
        }
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(self.co, self.ozone, self.no2, self.pm25, self.lat, self.lng)
    }

    /// Deduplication key: the coordinate pair, with `-0.0` folded into `0.0`
    pub fn location_key(&self) -> (u64, u64) {
        coordinate_key(self.lat, self.lng)
    }
}

/// Exact `(lat, lng)` identity used for corpus deduplication
pub fn coordinate_key(lat: f64, lng: f64) -> (u64, u64) {
    ((lat + 0.0).to_bits(), (lng + 0.0).to_bits())
}

/// Input values echoed back with a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInputs {
    pub co: f64,
    pub ozone: f64,
    pub no2: f64,
    pub pm25: f64,
    pub lat: f64,
    pub lng: f64,
}

impl From<FeatureVector> for PredictionInputs {
    fn from(v: FeatureVector) -> Self {
        Self {
            co: v.co,
            ozone: v.ozone,
            no2: v.no2,
            pm25: v.pm25,
            lat: v.lat,
            lng: v.lng,
        }
    }
}

/// Ensemble prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
    pub rf_prediction: f64,
    pub adaboost_prediction: f64,
    pub inputs: PredictionInputs,
}

/// A place to collect measurements for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: Some(name.into()),
        }
    }

    /// Name for log lines, falling back to the coordinates
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("({}, {})", self.lat, self.lng),
        }
    }
}

/// Cities sampled when no location list is given
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new(40.7128, -74.0060, "New York"),
        Location::new(51.5074, -0.1278, "London"),
        Location::new(48.8566, 2.3522, "Paris"),
        Location::new(35.6762, 139.6503, "Tokyo"),
        Location::new(39.9042, 116.4074, "Beijing"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_follows_feature_columns() {
        let v = FeatureVector::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(v.to_row(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(FEATURE_COLUMNS[0], "CO AQI Value");
        assert_eq!(FEATURE_COLUMNS[5], "lng");
    }

    #[test]
    fn test_non_finite_detected() {
        let v = FeatureVector::new(1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(v.first_non_finite(), Some("Ozone AQI Value"));
        assert_eq!(FeatureVector::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0).first_non_finite(), None);
    }

    #[test]
    fn test_location_key_folds_negative_zero() {
        let a = TrainingRecord::new(FeatureVector::new(0.0, 0.0, 0.0, 0.0, 0.0, -0.0), 1.0);
        let b = TrainingRecord::new(FeatureVector::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), 2.0);
        assert_eq!(a.location_key(), b.location_key());
    }

    #[test]
    fn test_location_label() {
        assert_eq!(Location::new(1.0, 2.0, "Paris").label(), "Paris");
        let unnamed = Location {
            lat: 1.5,
            lng: -2.0,
            name: None,
        };
        assert_eq!(unnamed.label(), "(1.5, -2)");
    }
}
