//! Lifecycle tests for the model registry

use super::*;
use crate::models::{FeatureVector, TrainingRecord};
use crate::regressor::Regressor;
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn small_config(model_dir: &std::path::Path) -> RegistryConfig {
    RegistryConfig {
        model_dir: model_dir.to_path_buf(),
        forest_trees: 8,
        boost_estimators: 8,
        ..Default::default()
    }
}

fn sample_records(n: usize) -> Vec<TrainingRecord> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            TrainingRecord::new(
                FeatureVector::new(x % 4.0, 10.0 + x, 5.0 + x / 2.0, 11.0 + 2.0 * x, x, -x),
                20.0 + 3.0 * x,
            )
        })
        .collect()
}

fn seeded_store(dir: &TempDir, n: usize) -> DatasetStore {
    let store = DatasetStore::new(dir.path().join("corpus.csv"));
    if n > 0 {
        store.merge_and_persist(&sample_records(n)).unwrap();
    }
    store
}

fn query() -> FeatureVector {
    FeatureVector::new(1.0, 10.0, 5.0, 11.0, 10.0, 5.0)
}

#[test]
fn test_fallback_training_reaches_ready_and_persists() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 20);
    let config = small_config(&dir.path().join("models"));

    let registry = ModelRegistry::initialize(&config, &store);

    assert!(registry.is_ready());
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Persisted);
    assert_eq!(registry.slot_state(ModelKind::AdaBoost), SlotState::Persisted);
    assert_eq!(registry.trained_records(), Some(20));

    let (forest, boost) = registry.models().unwrap();
    assert!(forest.predict(&query()).unwrap().is_finite());
    assert!(boost.predict(&query()).unwrap().is_finite());

    for kind in ModelKind::ALL {
        assert!(config.model_dir.join(kind.artifact_name()).exists());
    }
}

#[test]
fn test_single_record_corpus_is_enough() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 1);
    let registry = ModelRegistry::initialize(&small_config(dir.path()), &store);

    assert!(registry.is_ready());
    let (forest, _) = registry.models().unwrap();
    assert!(forest.predict(&query()).unwrap().is_finite());
}

#[test]
fn test_second_start_loads_without_training() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 15);
    let config = small_config(dir.path());

    let first = ModelRegistry::initialize(&config, &store);
    let (f1, b1) = first.models().unwrap();
    let expected = (f1.predict(&query()).unwrap(), b1.predict(&query()).unwrap());

    // Corpus removed: a second start must not need it
    fs::remove_file(store.path()).unwrap();
    let second = ModelRegistry::initialize(&config, &store);

    assert!(second.is_ready());
    assert_eq!(second.slot_state(ModelKind::RandomForest), SlotState::Loaded);
    assert_eq!(second.slot_state(ModelKind::AdaBoost), SlotState::Loaded);

    let (f2, b2) = second.models().unwrap();
    assert_eq!(f2.predict(&query()).unwrap(), expected.0);
    assert_eq!(b2.predict(&query()).unwrap(), expected.1);
}

#[test]
fn test_one_missing_artifact_retrains_both() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 12);
    let config = small_config(dir.path());

    ModelRegistry::initialize(&config, &store);
    fs::remove_file(dir.path().join(ModelKind::AdaBoost.artifact_name())).unwrap();

    let registry = ModelRegistry::initialize(&config, &store);
    assert!(registry.is_ready());
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Persisted);
    assert_eq!(registry.slot_state(ModelKind::AdaBoost), SlotState::Persisted);
}

#[test]
fn test_corrupt_artifact_triggers_retraining() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 12);
    let config = small_config(dir.path());

    ModelRegistry::initialize(&config, &store);
    fs::write(dir.path().join(ModelKind::RandomForest.artifact_name()), b"garbage").unwrap();

    let artifacts = ArtifactStore::new(dir.path());
    assert!(matches!(
        artifacts.load(ModelKind::RandomForest),
        Err(AqiError::Artifact { .. })
    ));

    let registry = ModelRegistry::initialize(&config, &store);
    assert!(registry.is_ready());
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Persisted);
}

#[test]
fn test_swapped_feature_schema_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 10);
    let config = small_config(dir.path());
    ModelRegistry::initialize(&config, &store);

    // Rewrite the forest artifact claiming lat/lng were trained swapped
    let path = dir.path().join(ModelKind::RandomForest.artifact_name());
    let mut envelope: ArtifactEnvelope = bincode::deserialize(&fs::read(&path).unwrap()).unwrap();
    envelope.feature_columns.swap(4, 5);
    fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

    let err = ArtifactStore::new(dir.path())
        .load(ModelKind::RandomForest)
        .unwrap_err();
    assert!(err.to_string().contains("feature schema"));

    let registry = ModelRegistry::initialize(&config, &store);
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Persisted);
}

#[test]
fn test_tampered_payload_fails_checksum() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 10);
    ModelRegistry::initialize(&small_config(dir.path()), &store);

    let path = dir.path().join(ModelKind::AdaBoost.artifact_name());
    let mut envelope: ArtifactEnvelope = bincode::deserialize(&fs::read(&path).unwrap()).unwrap();
    if let Some(last) = envelope.payload.last_mut() {
        *last ^= 0xff;
    }
    fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

    let err = ArtifactStore::new(dir.path())
        .load(ModelKind::AdaBoost)
        .unwrap_err();
    assert!(err.to_string().contains("checksum mismatch"));
}

#[test]
fn test_empty_corpus_leaves_registry_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 0);

    let registry = ModelRegistry::initialize(&small_config(dir.path()), &store);

    assert!(!registry.is_ready());
    assert!(matches!(registry.status(), RegistryStatus::Unavailable { .. }));
    assert!(matches!(registry.models(), Err(AqiError::ModelUnavailable(_))));
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Unloaded);
}

#[test]
fn test_unreadable_corpus_leaves_registry_unavailable() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus.csv");
    fs::write(&corpus, "AQI Value,CO AQI Value,Ozone AQI Value,NO2 AQI Value,PM2.5 AQI Value,lat,lng\nx,y,z,1,2,3,4\n").unwrap();

    let registry = ModelRegistry::initialize(&small_config(dir.path()), &DatasetStore::new(corpus));
    assert!(!registry.is_ready());
}

#[test]
fn test_persist_failure_keeps_serving_from_memory() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 10);

    // Model directory path is occupied by a regular file
    let blocker = dir.path().join("models");
    fs::write(&blocker, "not a directory").unwrap();

    let registry = ModelRegistry::initialize(&small_config(&blocker), &store);

    assert!(registry.is_ready());
    assert_eq!(registry.slot_state(ModelKind::RandomForest), SlotState::Trained);
    assert_eq!(registry.slot_state(ModelKind::AdaBoost), SlotState::Trained);
    assert!(registry.models().is_ok());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_persist_failure_emits_structured_event() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir, 10);
    let blocker = dir.path().join("models");
    fs::write(&blocker, "not a directory").unwrap();

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(logs.clone())
        .finish();
    let registry = tracing::subscriber::with_default(subscriber, || {
        ModelRegistry::initialize(&small_config(&blocker), &store)
    });
    assert!(registry.is_ready());

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let events: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("model_persist_failed"))
        .collect();
    assert_eq!(events.len(), 2);
    assert!(events.iter().any(|line| line.contains("random_forest")));
    assert!(events.iter().any(|line| line.contains("model-registry")));
}

#[test]
fn test_training_is_deterministic() {
    let corpus = Dataset::new(sample_records(25));
    let config = RegistryConfig {
        forest_trees: 10,
        boost_estimators: 10,
        ..Default::default()
    };

    let (f1, b1) = ModelRegistry::train(&config, &corpus).unwrap();
    let (f2, b2) = ModelRegistry::train(&config, &corpus).unwrap();

    for record in corpus.records().iter().step_by(3) {
        let v = record.features();
        assert_eq!(f1.predict(&v).unwrap(), f2.predict(&v).unwrap());
        assert_eq!(b1.predict(&v).unwrap(), b2.predict(&v).unwrap());
    }
    assert_eq!(f1.predict(&query()).unwrap(), f2.predict(&query()).unwrap());
}

#[test]
fn test_unavailable_constructor() {
    let registry = ModelRegistry::unavailable("no corpus");
    assert_eq!(
        registry.status(),
        &RegistryStatus::Unavailable {
            reason: "no corpus".to_string()
        }
    );
    assert!(registry.trained_records().is_none());
}
