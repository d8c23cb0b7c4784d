//! OpenWeather air pollution adapter

use super::{MeasurementSource, RawReading};
use crate::error::{AqiError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const PROVIDER: &str = "openweather";

#[derive(Debug, Deserialize)]
struct PollutionResponse {
    #[serde(default)]
    list: Vec<PollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct PollutionEntry {
    main: PollutionMain,
    components: Components,
}

#[derive(Debug, Deserialize)]
struct PollutionMain {
    aqi: f64,
}

#[derive(Debug, Deserialize)]
struct Components {
    #[serde(default)]
    co: f64,
    #[serde(default)]
    no2: f64,
    #[serde(default)]
    o3: f64,
    #[serde(default)]
    pm2_5: f64,
}

/// Queries `GET {endpoint}?lat=..&lon=..&appid=..`
pub struct OpenWeatherSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl OpenWeatherSource {
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
impl MeasurementSource for OpenWeatherSource {
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
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AqiError::source_unavailable(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AqiError::source_unavailable(PROVIDER, format!("HTTP {}", status)));
        }

        let body: PollutionResponse = response
            .json()
            .await
            .map_err(|e| AqiError::source_unavailable(PROVIDER, e))?;

        let entry = body
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AqiError::source_unavailable(PROVIDER, "empty pollution list"))?;

        Ok(RawReading {
            co: entry.components.co,
            no2: entry.components.no2,
            o3: entry.components.o3,
            pm2_5: entry.components.pm2_5,
            aqi: entry.main.aqi,
        })
    }
}
