//! Health and readiness reporting
//!
//! Liveness always reports healthy while the process runs; readiness
//! follows the model registry status.

use crate::registry::{ModelRegistry, RegistryStatus};
use serde::{Deserialize, Serialize};

pub const HEALTHY: &str = "healthy";

/// Liveness response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models_loaded: bool,
}

impl HealthResponse {
    pub fn from_registry(registry: &ModelRegistry) -> Self {
        Self {
            status: HEALTHY.to_string(),
            models_loaded: registry.is_ready(),
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessResponse {
    pub fn from_registry(registry: &ModelRegistry) -> Self {
        match registry.status() {
            RegistryStatus::Ready => Self {
                ready: true,
                reason: None,
            },
            RegistryStatus::Unavailable { reason } => Self {
                ready: false,
                reason: Some(reason.clone()),
            },
        }
    }
}
