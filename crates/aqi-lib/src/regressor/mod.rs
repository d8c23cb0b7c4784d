//! The two ensemble regressors behind the predictor
//!
//! Both are built from `aprender` regression trees and fitted on the same
//! feature matrix, in [`FEATURE_COLUMNS`](crate::models::FEATURE_COLUMNS)
//! order.

mod boost;
mod forest;

pub use boost::{AdaBoostRegressor, BoostParams};
pub use forest::{ForestParams, ForestRegressor};

use crate::error::{AqiError, Result};
use crate::models::{FeatureVector, NUM_FEATURES};
use aprender::primitives::{Matrix, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two artifact slots a model occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Bagged regression trees (variance reducing)
    RandomForest,
    /// AdaBoost.R2 over shallow regression trees
    AdaBoost,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::RandomForest, ModelKind::AdaBoost];

    /// Fixed persistence key for this model kind
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest_model.bin",
            ModelKind::AdaBoost => "adaboost_model.bin",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::AdaBoost => "adaboost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for fitted regressors
pub trait Regressor: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Predict a single AQI value
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// A fitted model of either kind
#[derive(Debug, Clone)]
pub enum TrainedModel {
    RandomForest(ForestRegressor),
    AdaBoost(AdaBoostRegressor),
}

impl TrainedModel {
    /// Serialize the fitted model into an opaque artifact payload
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            TrainedModel::RandomForest(m) => bincode::serialize(m),
            TrainedModel::AdaBoost(m) => bincode::serialize(m),
        };
        bytes.map_err(|e| AqiError::Training(format!("failed to serialize {} model: {}", self.kind(), e)))
    }

    /// Rebuild a fitted model from a payload written by [`Self::to_payload`]
    pub fn from_payload(kind: ModelKind, payload: &[u8]) -> std::result::Result<Self, String> {
        match kind {
            ModelKind::RandomForest => bincode::deserialize::<ForestRegressor>(payload)
                .map(TrainedModel::RandomForest)
                .map_err(|e| e.to_string()),
            ModelKind::AdaBoost => bincode::deserialize::<AdaBoostRegressor>(payload)
                .map(TrainedModel::AdaBoost)
                .map_err(|e| e.to_string()),
        }
    }
}

impl Regressor for TrainedModel {
    fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::AdaBoost(_) => ModelKind::AdaBoost,
        }
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        match self {
            TrainedModel::RandomForest(m) => m.predict(features),
            TrainedModel::AdaBoost(m) => m.predict(features),
        }
    }
}

/// Row-major training data shared by both fitting routines
#[derive(Debug, Clone)]
pub struct TrainingData {
    rows: Vec<[f32; NUM_FEATURES]>,
    labels: Vec<f32>,
}

impl TrainingData {
    pub fn new(features: &[FeatureVector], labels: &[f64]) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(AqiError::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(AqiError::Training("cannot fit with zero records".to_string()));
        }

        let rows = features
            .iter()
            .map(|v| v.to_row().map(|x| x as f32))
            .collect();
        let labels = labels.iter().map(|&y| y as f32).collect();
        Ok(Self { rows, labels })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    pub fn matrix(&self) -> Result<Matrix<f32>> {
        rows_to_matrix(self.rows.iter())
    }

    pub fn targets(&self) -> Vector<f32> {
        Vector::from_slice(&self.labels)
    }

    /// Matrix and targets for the rows at `indices`, with repeats
    pub fn resample(&self, indices: &[usize]) -> Result<(Matrix<f32>, Vector<f32>)> {
        let x = rows_to_matrix(indices.iter().map(|&i| &self.rows[i]))?;
        let y: Vec<f32> = indices.iter().map(|&i| self.labels[i]).collect();
        Ok((x, Vector::from_vec(y)))
    }
}

fn rows_to_matrix<'a>(rows: impl Iterator<Item = &'a [f32; NUM_FEATURES]>) -> Result<Matrix<f32>> {
    let data: Vec<f32> = rows.flat_map(|r| r.iter().copied()).collect();
    let n_rows = data.len() / NUM_FEATURES;
    Matrix::from_vec(n_rows, NUM_FEATURES, data).map_err(|e| AqiError::Training(e.to_string()))
}

/// Single-row input matrix for inference
pub(crate) fn single_row(features: &FeatureVector) -> Result<Matrix<f32>> {
    let row = features.to_row().map(|x| x as f32);
    rows_to_matrix(std::iter::once(&row))
}
