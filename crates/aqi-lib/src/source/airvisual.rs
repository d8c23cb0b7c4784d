//! AirVisual nearest-city adapter

use super::{MeasurementSource, RawReading};
use crate::error::{AqiError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const PROVIDER: &str = "airvisual";

#[derive(Debug, Deserialize)]
struct NearestCityResponse {
    data: CityData,
}

#[derive(Debug, Deserialize)]
struct CityData {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    pollution: Pollution,
}

// Free-tier replies carry only `aqius`; pollutant fields default to zero.
#[derive(Debug, Deserialize)]
struct Pollution {
    aqius: f64,
    #[serde(default)]
    co: f64,
    #[serde(default)]
    no2: f64,
    #[serde(default)]
    o3: f64,
    #[serde(default)]
    pm25: f64,
}

/// Queries `GET {endpoint}?lat=..&lon=..&key=..`
pub struct AirVisualSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl AirVisualSource {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: String) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| AqiError::source_unavailable(PROVIDER, e))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl MeasurementSource for AirVisualSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch_raw(&self, lat: f64, lng: f64) -> Result<RawReading> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AqiError::source_unavailable(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AqiError::source_unavailable(PROVIDER, format!("HTTP {}", status)));
        }

        let body: NearestCityResponse = response
            .json()
            .await
            .map_err(|e| AqiError::source_unavailable(PROVIDER, e))?;
        let pollution = body.data.current.pollution;

        Ok(RawReading {
            co: pollution.co,
            no2: pollution.no2,
            o3: pollution.o3,
            pm2_5: pollution.pm25,
            aqi: pollution.aqius,
        })
    }
}
