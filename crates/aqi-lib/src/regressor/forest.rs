//! Random forest regressor

use super::{single_row, ModelKind, Regressor, TrainingData};
use crate::error::{AqiError, Result};
use crate::models::FeatureVector;
use aprender::tree::RandomForestRegressor;
use serde::{Deserialize, Serialize};

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: 42,
        }
    }
}

/// Fitted random forest over fully grown regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestRegressor {
    params: ForestParams,
    inner: RandomForestRegressor,
}

impl ForestRegressor {
    pub fn fit(data: &TrainingData, params: ForestParams) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(AqiError::Training("random forest needs at least one tree".to_string()));
        }

        let x = data.matrix()?;
        let y = data.targets();

        let mut inner = RandomForestRegressor::new(params.n_estimators)
            .with_random_state(params.random_state);
        inner
            .fit(&x, &y)
            .map_err(|e| AqiError::Training(format!("random forest: {}", e)))?;

        Ok(Self { params, inner })
    }
}

impl Regressor for ForestRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x = single_row(features)?;
        let out = self.inner.predict(&x);
        out.as_slice()
            .first()
            .map(|&v| v as f64)
            .ok_or_else(|| AqiError::Training("random forest produced no output".to_string()))
    }
}
