//! AQI estimation library
//!
//! This crate provides the core functionality for:
//! - Training corpus storage with merge and deduplication
//! - Random forest and AdaBoost regressors over the six-feature schema
//! - A load-or-train model registry with persisted artifacts
//! - Ensemble prediction
//! - Measurement collection from external providers
//! - Health checks and observability

pub mod dataset;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;
pub mod regressor;
pub mod source;

pub use dataset::{Dataset, DatasetStore};
pub use error::{AqiError, Result};
pub use health::{HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{EnsemblePredictor, Predictor};
pub use registry::{ModelRegistry, RegistryConfig, RegistryStatus};
