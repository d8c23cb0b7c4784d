//! Model registry: load-or-train lifecycle for the two artifacts
//!
//! At startup the registry tries to load both persisted artifacts. If
//! either is missing or unusable, both models are retrained from the full
//! corpus so they always share one data snapshot, then persisted on a
//! best-effort basis. Once initialized the registry is read-only.

mod artifact;

#[cfg(test)]
mod tests;

pub use artifact::{compute_checksum, ArtifactEnvelope, ArtifactStore, ModelArtifact};

use crate::dataset::{Dataset, DatasetStore};
use crate::error::{AqiError, Result};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::regressor::{
    AdaBoostRegressor, BoostParams, ForestParams, ForestRegressor, ModelKind, TrainedModel,
    TrainingData,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Service name on registry log events
const REGISTRY_SERVICE: &str = "model-registry";

/// Lifecycle of one artifact slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Unloaded,
    /// Deserialized from its persisted artifact
    Loaded,
    /// Fitted in memory, not (yet) persisted
    Trained,
    /// Fitted and written to its artifact file
    Persisted,
}

/// Whether the registry can serve predictions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryStatus {
    Ready,
    Unavailable { reason: String },
}

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding the two artifact files
    pub model_dir: PathBuf,
    /// Seed shared by both regressors
    pub seed: u64,
    pub forest_trees: usize,
    pub boost_estimators: usize,
    pub boost_max_depth: usize,
    pub boost_learning_rate: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("."),
            seed: 42,
            forest_trees: 100,
            boost_estimators: 50,
            boost_max_depth: 3,
            boost_learning_rate: 1.0,
        }
    }
}

impl RegistryConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.forest_trees,
            random_state: self.seed,
        }
    }

    pub fn boost_params(&self) -> BoostParams {
        BoostParams {
            n_estimators: self.boost_estimators,
            learning_rate: self.boost_learning_rate,
            max_depth: self.boost_max_depth,
            random_state: self.seed,
        }
    }
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    artifact: Option<ModelArtifact>,
}

impl Slot {
    fn unloaded() -> Self {
        Self {
            state: SlotState::Unloaded,
            artifact: None,
        }
    }

    fn with(state: SlotState, artifact: ModelArtifact) -> Self {
        Self {
            state,
            artifact: Some(artifact),
        }
    }
}

/// Owner of the random forest and AdaBoost artifacts
#[derive(Debug)]
pub struct ModelRegistry {
    status: RegistryStatus,
    forest: Slot,
    boost: Slot,
}

impl ModelRegistry {
    /// A registry that will refuse every prediction
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status: RegistryStatus::Unavailable {
                reason: reason.into(),
            },
            forest: Slot::unloaded(),
            boost: Slot::unloaded(),
        }
    }

    /// Run the startup contract: load both artifacts, otherwise retrain
    /// both from `dataset` and persist them.
    ///
    /// Never fails; problems surface as [`RegistryStatus::Unavailable`].
    /// Blocking, and may take a while when training is needed.
    pub fn initialize(config: &RegistryConfig, dataset: &DatasetStore) -> Self {
        let metrics = ServiceMetrics::new();
        let artifacts = ArtifactStore::new(&config.model_dir);

        let registry = match Self::load_persisted(&artifacts) {
            Ok(registry) => registry,
            Err(e) => {
                info!(error = %e, "Persisted models unusable, training from corpus");
                Self::train_and_persist(config, dataset, &artifacts, &metrics)
            }
        };

        metrics.set_models_loaded(registry.is_ready());
        registry
    }

    /// Build a ready registry from both persisted artifacts.
    ///
    /// Partial results are discarded when either artifact fails.
    pub fn load_persisted(artifacts: &ArtifactStore) -> Result<Self> {
        let forest = artifacts.load(ModelKind::RandomForest)?;
        let boost = artifacts.load(ModelKind::AdaBoost)?;

        info!(
            forest_records = forest.n_records,
            boost_records = boost.n_records,
            "Models loaded successfully"
        );

        Ok(Self {
            status: RegistryStatus::Ready,
            forest: Slot::with(SlotState::Loaded, forest),
            boost: Slot::with(SlotState::Loaded, boost),
        })
    }

    fn train_and_persist(
        config: &RegistryConfig,
        dataset: &DatasetStore,
        artifacts: &ArtifactStore,
        metrics: &ServiceMetrics,
    ) -> Self {
        let corpus = match dataset.load() {
            Ok(corpus) => corpus,
            Err(e) => {
                error!(error = %e, "Failed to load corpus for training");
                return Self::unavailable(e.to_string());
            }
        };
        metrics.set_dataset_records(corpus.len());

        let start = Instant::now();
        let (forest, boost) = match Self::train(config, &corpus) {
            Ok(models) => models,
            Err(e) => {
                error!(error = %e, records = corpus.len(), "Error training models");
                return Self::unavailable(e.to_string());
            }
        };
        let elapsed = start.elapsed().as_secs_f64();
        metrics.observe_training_duration(elapsed);
        info!(
            records = corpus.len(),
            duration_secs = elapsed,
            "Models trained"
        );

        let logger = StructuredLogger::new(REGISTRY_SERVICE);
        let forest = ModelArtifact::new(forest, corpus.len());
        let boost = ModelArtifact::new(boost, corpus.len());

        Self {
            status: RegistryStatus::Ready,
            forest: persist_slot(artifacts, forest, &logger),
            boost: persist_slot(artifacts, boost, &logger),
        }
    }

    /// Fit both models on every record of `corpus`
    pub fn train(config: &RegistryConfig, corpus: &Dataset) -> Result<(TrainedModel, TrainedModel)> {
        if corpus.is_empty() {
            return Err(AqiError::Training("corpus has no records".to_string()));
        }

        let (features, labels) = corpus.training_pairs();
        let data = TrainingData::new(&features, &labels)?;

        let forest = ForestRegressor::fit(&data, config.forest_params())?;
        let boost = AdaBoostRegressor::fit(&data, config.boost_params())?;

        Ok((TrainedModel::RandomForest(forest), TrainedModel::AdaBoost(boost)))
    }

    pub fn status(&self) -> &RegistryStatus {
        &self.status
    }

    /// True only when both slots hold a usable model
    pub fn is_ready(&self) -> bool {
        self.status == RegistryStatus::Ready
            && self.forest.artifact.is_some()
            && self.boost.artifact.is_some()
    }

    pub fn slot_state(&self, kind: ModelKind) -> SlotState {
        match kind {
            ModelKind::RandomForest => self.forest.state,
            ModelKind::AdaBoost => self.boost.state,
        }
    }

    /// Both models, or the reason they cannot be used
    pub fn models(&self) -> Result<(&TrainedModel, &TrainedModel)> {
        if let RegistryStatus::Unavailable { reason } = &self.status {
            return Err(AqiError::ModelUnavailable(reason.clone()));
        }
        match (&self.forest.artifact, &self.boost.artifact) {
            (Some(forest), Some(boost)) => Ok((&forest.model, &boost.model)),
            _ => Err(AqiError::ModelUnavailable("models not loaded".to_string())),
        }
    }

    /// Number of records the current models were trained on
    pub fn trained_records(&self) -> Option<usize> {
        self.forest.artifact.as_ref().map(|a| a.n_records)
    }
}

/// Persistence failure is logged and leaves the slot in `Trained`
fn persist_slot(artifacts: &ArtifactStore, artifact: ModelArtifact, logger: &StructuredLogger) -> Slot {
    match artifacts.save(&artifact) {
        Ok(_) => Slot::with(SlotState::Persisted, artifact),
        Err(e) => {
            logger.log_persist_failed(artifact.kind().as_str(), &e.to_string());
            Slot::with(SlotState::Trained, artifact)
        }
    }
}
