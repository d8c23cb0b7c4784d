//! AdaBoost.R2 regressor
//!
//! Each round draws a weighted bootstrap sample, fits a shallow
//! `aprender` regression tree on it, and reweights the training rows by
//! their linear loss. Prediction is the weighted median of the rounds.

use super::{single_row, ModelKind, Regressor, TrainingData};
use crate::error::{AqiError, Result};
use crate::models::FeatureVector;
use aprender::tree::DecisionTreeRegressor;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// AdaBoost hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth of each weak learner
    pub max_depth: usize,
    pub random_state: u64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            max_depth: 3,
            random_state: 42,
        }
    }
}

/// Fitted AdaBoost.R2 ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    params: BoostParams,
    estimators: Vec<DecisionTreeRegressor>,
    estimator_weights: Vec<f64>,
}

impl AdaBoostRegressor {
    pub fn fit(data: &TrainingData, params: BoostParams) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(AqiError::Training("adaboost needs at least one estimator".to_string()));
        }
        if !(params.learning_rate > 0.0) {
            return Err(AqiError::Training("adaboost learning rate must be positive".to_string()));
        }

        let n = data.len();
        let full = data.matrix()?;
        let labels = data.labels();
        let mut rng = StdRng::seed_from_u64(params.random_state);
        let mut sample_weights = vec![1.0 / n as f64; n];

        let mut estimators = Vec::with_capacity(params.n_estimators);
        let mut estimator_weights = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let sampler = WeightedIndex::new(&sample_weights)
                .map_err(|e| AqiError::Training(format!("adaboost sample weights: {}", e)))?;
            let indices: Vec<usize> = (0..n).map(|_| sampler.sample(&mut rng)).collect();
            let (x, y) = data.resample(&indices)?;

            let mut tree = DecisionTreeRegressor::new().with_max_depth(params.max_depth);
            tree.fit(&x, &y)
                .map_err(|e| AqiError::Training(format!("adaboost round {}: {}", round, e)))?;

            let predicted = tree.predict(&full);
            let mut errors: Vec<f64> = predicted
                .as_slice()
                .iter()
                .zip(labels)
                .map(|(&p, &t)| (p as f64 - t as f64).abs())
                .collect();

            let max_error = errors.iter().copied().fold(0.0_f64, f64::max);
            if max_error > 0.0 {
                errors.iter_mut().for_each(|e| *e /= max_error);
            }

            let estimator_error: f64 = sample_weights
                .iter()
                .zip(&errors)
                .map(|(w, e)| w * e)
                .sum();

            if estimator_error <= 0.0 {
                // Perfect fit on every row, nothing left to boost
                estimators.push(tree);
                estimator_weights.push(1.0);
                break;
            }

            if estimator_error >= 0.5 {
                // Worse than chance: keep it only when nothing else exists
                if estimators.is_empty() {
                    estimators.push(tree);
                    estimator_weights.push(1.0);
                }
                debug!(round, estimator_error, "Stopping boosting early");
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            let weight = params.learning_rate * (1.0 / beta).ln();
            estimators.push(tree);
            estimator_weights.push(weight);

            if round + 1 == params.n_estimators {
                break;
            }

            for (w, e) in sample_weights.iter_mut().zip(&errors) {
                *w *= beta.powf((1.0 - e) * params.learning_rate);
            }
            let total: f64 = sample_weights.iter().sum();
            if !(total > 0.0) {
                break;
            }
            sample_weights.iter_mut().for_each(|w| *w /= total);
        }

        Ok(Self {
            params,
            estimators,
            estimator_weights,
        })
    }
}

impl Regressor for AdaBoostRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::AdaBoost
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x = single_row(features)?;
        let mut votes: Vec<(f64, f64)> = Vec::with_capacity(self.estimators.len());
        for (tree, &weight) in self.estimators.iter().zip(&self.estimator_weights) {
            let out = tree.predict(&x);
            let value = out
                .as_slice()
                .first()
                .copied()
                .ok_or_else(|| AqiError::Training("adaboost tree produced no output".to_string()))?;
            votes.push((value as f64, weight));
        }
        weighted_median(&mut votes)
            .ok_or_else(|| AqiError::Training("adaboost model has no estimators".to_string()))
    }
}

/// Smallest value whose cumulative weight reaches half the total
fn weighted_median(votes: &mut [(f64, f64)]) -> Option<f64> {
    if votes.is_empty() {
        return None;
    }
    votes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: f64 = votes.iter().map(|(_, w)| w).sum();
    let half = 0.5 * total;
    let mut cumulative = 0.0;
    for &(value, weight) in votes.iter() {
        cumulative += weight;
        if cumulative >= half {
            return Some(value);
        }
    }
    votes.last().map(|(value, _)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_data(n: usize) -> TrainingData {
        let features: Vec<FeatureVector> = (0..n)
            .map(|i| FeatureVector::new(i as f64, 0.0, 0.0, 0.0, 10.0, 5.0))
            .collect();
        let labels: Vec<f64> = (0..n).map(|i| (i * 3) as f64).collect();
        TrainingData::new(&features, &labels).unwrap()
    }

    #[test]
    fn test_weighted_median_picks_heaviest_half() {
        let mut votes = vec![(10.0, 0.1), (30.0, 0.6), (20.0, 0.3)];
        assert_eq!(weighted_median(&mut votes), Some(30.0));

        let mut even = vec![(1.0, 1.0), (2.0, 1.0)];
        assert_eq!(weighted_median(&mut even), Some(1.0));

        assert_eq!(weighted_median(&mut []), None);
    }

    #[test]
    fn test_fit_tracks_training_signal() {
        let data = line_data(30);
        let model = AdaBoostRegressor::fit(&data, BoostParams::default()).unwrap();
        assert!(model.estimators.len() >= 1);

        let low = model
            .predict(&FeatureVector::new(2.0, 0.0, 0.0, 0.0, 10.0, 5.0))
            .unwrap();
        let high = model
            .predict(&FeatureVector::new(27.0, 0.0, 0.0, 0.0, 10.0, 5.0))
            .unwrap();
        assert!(high > low, "expected {} > {}", high, low);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let data = line_data(25);
        let a = AdaBoostRegressor::fit(&data, BoostParams::default()).unwrap();
        let b = AdaBoostRegressor::fit(&data, BoostParams::default()).unwrap();

        for i in 0..25 {
            let v = FeatureVector::new(i as f64 + 0.5, 0.0, 0.0, 0.0, 10.0, 5.0);
            assert_eq!(a.predict(&v).unwrap(), b.predict(&v).unwrap());
        }
    }

    #[test]
    fn test_constant_target_stops_after_one_round() {
        let features: Vec<FeatureVector> = (0..5)
            .map(|i| FeatureVector::new(i as f64, 1.0, 1.0, 1.0, 0.0, 0.0))
            .collect();
        let data = TrainingData::new(&features, &[42.0; 5]).unwrap();

        let model = AdaBoostRegressor::fit(&data, BoostParams::default()).unwrap();
        assert_eq!(model.estimators.len(), 1);
        let out = model.predict(&features[0]).unwrap();
        assert!((out - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let params = BoostParams {
            n_estimators: 0,
            ..Default::default()
        };
        assert!(AdaBoostRegressor::fit(&line_data(3), params).is_err());
    }
}
