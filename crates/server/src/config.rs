//! Server configuration

use aqi_lib::dataset::DEFAULT_DATASET_FILE;
use aqi_lib::RegistryConfig;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `AQI_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Training corpus used when artifacts must be rebuilt
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Directory holding the persisted model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_rf_trees")]
    pub rf_trees: usize,

    #[serde(default = "default_boost_estimators")]
    pub boost_estimators: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_FILE)
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_seed() -> u64 {
    42
}

fn default_rf_trees() -> usize {
    100
}

fn default_boost_estimators() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dataset_path: default_dataset_path(),
            model_dir: default_model_dir(),
            seed: default_seed(),
            rf_trees: default_rf_trees(),
            boost_estimators: default_boost_estimators(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AQI").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            model_dir: self.model_dir.clone(),
            seed: self.seed,
            forest_trees: self.rf_trees,
            boost_estimators: self.boost_estimators,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.dataset_path, PathBuf::from("AQI-and-Lat-Long-of-Countries.csv"));

        let registry = config.registry_config();
        assert_eq!(registry.seed, 42);
        assert_eq!(registry.forest_trees, 100);
        assert_eq!(registry.boost_estimators, 50);
        assert_eq!(registry.boost_max_depth, 3);
    }

    #[test]
    fn test_empty_source_deserializes_to_defaults() {
        let config: ServerConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model_dir, PathBuf::from("."));
    }
}
