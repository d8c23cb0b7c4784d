//! Prediction and health commands

use anyhow::Result;
use aqi_lib::FeatureVector;
use colored::Colorize;

use crate::client::{ApiClient, PredictRequest};
use crate::output::{color_aqi, color_status, print_json, OutputFormat};

/// Request a combined estimate from the server
pub async fn predict(client: &ApiClient, features: FeatureVector, format: OutputFormat) -> Result<()> {
    let response = client.predict(&PredictRequest::from(features)).await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            println!("{}", "AQI Prediction".bold());
            println!("{}", "=".repeat(50));
            println!("Combined:               {}", color_aqi(response.prediction));
            println!("Random forest:          {:.2}", response.rf_prediction);
            println!("AdaBoost:               {:.2}", response.adaboost_prediction);
            println!();
            println!("{}", "Inputs".bold());
            println!("{}", "-".repeat(50));
            let inputs = response.inputs;
            println!("CO / Ozone / NO2:       {} / {} / {}", inputs.co, inputs.ozone, inputs.no2);
            println!("PM2.5:                  {}", inputs.pm25);
            println!("Location:               ({}, {})", inputs.lat, inputs.lng);
        }
    }

    Ok(())
}

/// Show server liveness and model state
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health),
        OutputFormat::Table => {
            println!("Status:                 {}", color_status(&health.status));
            let loaded = if health.models_loaded { "yes" } else { "no" };
            println!("Models loaded:          {}", color_status(loaded));
        }
    }

    Ok(())
}
