//! Corpus maintenance commands

use anyhow::Result;
use aqi_lib::DatasetStore;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::output::{print_json, print_success, OutputFormat};

#[derive(Debug, Serialize)]
struct DatasetStats {
    path: String,
    records: usize,
    real_time_records: usize,
    min_aqi: Option<f64>,
    max_aqi: Option<f64>,
    mean_aqi: Option<f64>,
}

/// Merge a snapshot file into the corpus
pub fn merge(store: &DatasetStore, snapshot: &Path, format: OutputFormat) -> Result<()> {
    let total = store.merge_snapshot(snapshot)?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "dataset": store.path().display().to_string(),
            "records": total,
        })),
        OutputFormat::Table => print_success(&format!(
            "Merged {} into {} ({} records)",
            snapshot.display(),
            store.path().display(),
            total
        )),
    }

    Ok(())
}

/// Show corpus size and label range
pub fn stats(store: &DatasetStore, format: OutputFormat) -> Result<()> {
    let dataset = store.load()?;
    let labels: Vec<f64> = dataset.records().iter().map(|r| r.aqi).collect();

    let stats = DatasetStats {
        path: store.path().display().to_string(),
        records: dataset.len(),
        real_time_records: dataset
            .records()
            .iter()
            .filter(|r| r.source.as_deref() == Some(aqi_lib::source::REAL_TIME_SOURCE))
            .count(),
        min_aqi: labels.iter().copied().reduce(f64::min),
        max_aqi: labels.iter().copied().reduce(f64::max),
        mean_aqi: if labels.is_empty() {
            None
        } else {
            Some(labels.iter().sum::<f64>() / labels.len() as f64)
        },
    };

    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Table => {
            println!("{}", "Dataset".bold());
            println!("{}", "=".repeat(50));
            println!("Path:                   {}", stats.path.cyan());
            println!("Records:                {}", stats.records);
            println!("Collected (real time):  {}", stats.real_time_records);
            if let (Some(min), Some(max), Some(mean)) = (stats.min_aqi, stats.max_aqi, stats.mean_aqi) {
                println!("AQI range:              {:.1} - {:.1}", min, max);
                println!("AQI mean:               {:.2}", mean);
            }
        }
    }

    Ok(())
}
