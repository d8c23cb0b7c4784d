//! Measurement collection command

use anyhow::{Context, Result};
use aqi_lib::{
    default_locations,
    observability::StructuredLogger,
    source::{Collector, CollectorConfig, Credentials, SourceChain, SourceConfig},
    DatasetStore, Location, TrainingRecord,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::Tabled;

use crate::output::{print_info, print_success, print_table, print_warning, OutputFormat};

/// Options for `aqi collect`
pub struct CollectOptions {
    pub locations: Option<PathBuf>,
    pub snapshot: PathBuf,
    pub merge: bool,
    pub dataset: PathBuf,
    pub delay: Duration,
}

/// Row for collected readings table
#[derive(Tabled, Serialize)]
struct ReadingRow {
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "AQI")]
    aqi: f64,
    #[tabled(rename = "CO")]
    co: f64,
    #[tabled(rename = "Ozone")]
    ozone: f64,
    #[tabled(rename = "NO2")]
    no2: f64,
    #[tabled(rename = "PM2.5")]
    pm25: f64,
}

/// Read a JSON list of `{lat, lng, name?}` objects
pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read locations file {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse locations file")
}

/// Collect readings, write the snapshot and optionally merge into the corpus
pub async fn collect(options: CollectOptions, format: OutputFormat) -> Result<()> {
    let locations = match &options.locations {
        Some(path) => load_locations(path)?,
        None => default_locations(),
    };

    let credentials = Credentials::from_env();
    if !credentials.any_configured() {
        print_warning("No API keys configured. Set OPENWEATHER_API_KEY or AIRVISUAL_API_KEY for real data collection");
    }

    let chain = SourceChain::from_credentials(&credentials, &SourceConfig::default())?;
    if let Some(name) = chain.active_source() {
        print_info(&format!("Collecting {} locations from {}", locations.len(), name));
    }

    let collector = Collector::new(chain, CollectorConfig { delay: options.delay });
    let records = collector.collect(&locations).await;

    let logger = StructuredLogger::new("aqi-cli");
    logger.log_collection(locations.len(), records.len());

    if records.is_empty() {
        print_warning("No data collected. Check API keys and network connection.");
        return Ok(());
    }

    print_table(&reading_rows(&locations, &records), format);

    let store = DatasetStore::new(&options.dataset);
    store.save_snapshot(&records, &options.snapshot)?;
    print_success(&format!(
        "Saved {} readings to {}",
        records.len(),
        options.snapshot.display()
    ));

    if options.merge {
        let total = store.merge_and_persist(&records)?;
        logger.log_dataset_merge(records.len(), total);
        print_success(&format!(
            "Merged into {} ({} records)",
            options.dataset.display(),
            total
        ));
    }

    Ok(())
}

fn reading_rows(locations: &[Location], records: &[TrainingRecord]) -> Vec<ReadingRow> {
    records
        .iter()
        .map(|r| {
            let location = locations
                .iter()
                .find(|l| l.lat == r.lat && l.lng == r.lng)
                .map(|l| l.label())
                .unwrap_or_else(|| format!("({}, {})", r.lat, r.lng));
            ReadingRow {
                location,
                aqi: r.aqi,
                co: r.co,
                ozone: r.ozone,
                no2: r.no2,
                pm25: r.pm25,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_locations_name_optional() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(
            &path,
            r#"[{"lat": 52.52, "lng": 13.405, "name": "Berlin"}, {"lat": -33.87, "lng": 151.21}]"#,
        )
        .unwrap();

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].label(), "Berlin");
        assert!(locations[1].name.is_none());
    }

    #[test]
    fn test_load_locations_rejects_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(&path, r#"{"lat": 1}"#).unwrap();

        assert!(load_locations(&path).is_err());
    }
}
