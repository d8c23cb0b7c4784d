//! Batch collection over a list of locations

use super::SourceChain;
use crate::models::{Location, TrainingRecord};
use std::time::Duration;
use tracing::{debug, info};

/// Pause between successive location fetches
pub const DEFAULT_LOCATION_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_LOCATION_DELAY,
        }
    }
}

/// Fetches one reading per location and converts it into a corpus record
pub struct Collector {
    chain: SourceChain,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(chain: SourceChain, config: CollectorConfig) -> Self {
        Self { chain, config }
    }

    pub fn chain(&self) -> &SourceChain {
        &self.chain
    }

    /// Locations without a reading are skipped; output keeps input order.
    pub async fn collect(&self, locations: &[Location]) -> Vec<TrainingRecord> {
        let mut records = Vec::with_capacity(locations.len());

        for (i, location) in locations.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            info!(location = %location.label(), "Collecting measurement");
            match self.chain.fetch(location.lat, location.lng).await {
                Some(reading) => {
                    records.push(reading.to_training_record(location.lat, location.lng));
                }
                None => debug!(location = %location.label(), "No reading, skipping location"),
            }
        }

        records
    }
}
