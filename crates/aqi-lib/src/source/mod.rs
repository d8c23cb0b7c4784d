//! External measurement sources
//!
//! This module provides:
//! - Provider adapters (OpenWeather, AirVisual) returning raw pollutant readings
//! - A priority chain that degrades every provider failure to "no reading"
//! - Conversion of raw readings into corpus records
//! - Batch collection with a fixed inter-location delay

mod airvisual;
mod collector;
mod openweather;


pub use airvisual::AirVisualSource;
pub use collector::{Collector, CollectorConfig, DEFAULT_LOCATION_DELAY};
pub use openweather::OpenWeatherSource;

use crate::error::Result;
use crate::models::{FeatureVector, TrainingRecord};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound of every converted sub-index
pub const MAX_SUB_INDEX: f64 = 500.0;

/// Value written to the `source` column for collected rows
pub const REAL_TIME_SOURCE: &str = "real_time";

/// Bounded timeout for provider calls
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

pub const OPENWEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/air_pollution";
pub const AIRVISUAL_URL: &str = "http://api.airvisual.com/v2/nearest_city";

/// Pollutant reading in provider units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReading {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub pm2_5: f64,
    /// Provider's own overall index, used as the label
    pub aqi: f64,
}

impl RawReading {
    /// Fixed linear scaling into AQI sub-index values, clamped to 500
    pub fn to_feature_vector(&self, lat: f64, lng: f64) -> FeatureVector {
        FeatureVector::new(
            scale(self.co, 10.0),
            scale(self.o3, 2.0),
            scale(self.no2, 5.0),
            scale(self.pm2_5, 2.0),
            lat,
            lng,
        )
    }

    pub fn to_training_record(&self, lat: f64, lng: f64) -> TrainingRecord {
        let mut record = TrainingRecord::new(self.to_feature_vector(lat, lng), self.aqi);
        record.timestamp = Some(chrono::Utc::now().to_rfc3339());
        record.source = Some(REAL_TIME_SOURCE.to_string());
        record
    }
}

fn scale(value: f64, factor: f64) -> f64 {
    (value * factor).min(MAX_SUB_INDEX)
}

/// API keys for each provider; an empty key disables its provider
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openweather: String,
    pub airvisual: String,
    /// Read for completeness; no AirNow adapter exists
    pub airnow: String,
}

impl Credentials {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).unwrap_or_default().trim().to_string();
        Self {
            openweather: read("OPENWEATHER_API_KEY"),
            airvisual: read("AIRVISUAL_API_KEY"),
            airnow: read("AIRNOW_API_KEY"),
        }
    }

    pub fn any_configured(&self) -> bool {
        !self.openweather.is_empty() || !self.airvisual.is_empty()
    }
}

/// Provider endpoints and client settings
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub openweather_url: String,
    pub airvisual_url: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            openweather_url: OPENWEATHER_URL.to_string(),
            airvisual_url: AIRVISUAL_URL.to_string(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

/// Trait for measurement provider adapters
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// True when a non-empty credential is present
    fn is_configured(&self) -> bool;

    /// Query the provider. Errors are `AqiError::SourceUnavailable`.
    async fn fetch_raw(&self, lat: f64, lng: f64) -> Result<RawReading>;
}

/// Sources in fixed priority order
pub struct SourceChain {
    sources: Vec<Box<dyn MeasurementSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Box<dyn MeasurementSource>>) -> Self {
        Self { sources }
    }

    /// OpenWeather first, then AirVisual
    pub fn from_credentials(credentials: &Credentials, config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| crate::AqiError::source_unavailable("http", e))?;

        Ok(Self::new(vec![
            Box::new(OpenWeatherSource::new(
                client.clone(),
                &config.openweather_url,
                credentials.openweather.clone(),
            )?),
            Box::new(AirVisualSource::new(
                client,
                &config.airvisual_url,
                credentials.airvisual.clone(),
            )?),
        ]))
    }

    /// Name of the provider that [`Self::fetch`] would query
    pub fn active_source(&self) -> Option<&'static str> {
        self.sources
            .iter()
            .find(|s| s.is_configured())
            .map(|s| s.name())
    }

    /// Reading for one location, or `None` when no provider is configured
    /// or the chosen provider fails. Only the first configured provider is
    /// queried.
    pub async fn fetch(&self, lat: f64, lng: f64) -> Option<RawReading> {
        let Some(source) = self.sources.iter().find(|s| s.is_configured()) else {
            debug!(lat, lng, "No measurement source configured");
            return None;
        };

        match source.fetch_raw(lat, lng).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(source = source.name(), lat, lng, error = %e, "Measurement source unavailable");
                None
            }
        }
    }
}
