//! AQI Predictor CLI
//!
//! A command-line tool for collecting measurements, maintaining the
//! training corpus and querying the prediction server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use aqi_lib::{dataset::DEFAULT_SNAPSHOT_FILE, DatasetStore, FeatureVector};
use clap::{Parser, Subcommand};
use commands::{collect, dataset, predict};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// AQI Predictor CLI
#[derive(Parser)]
#[command(name = "aqi")]
#[command(author, version, about = "CLI for the AQI Ensemble Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via AQI_API_URL env var)
    #[arg(long, env = "AQI_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Training corpus path
    #[arg(long, env = "AQI_DATASET_PATH", default_value = aqi_lib::dataset::DEFAULT_DATASET_FILE)]
    pub dataset: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect real-time measurements from external providers
    Collect {
        /// JSON file with a list of {lat, lng, name?} objects
        #[arg(long)]
        locations: Option<PathBuf>,

        /// Snapshot file for the collected readings
        #[arg(long, default_value = DEFAULT_SNAPSHOT_FILE)]
        snapshot: PathBuf,

        /// Also merge the readings into the training corpus
        #[arg(long)]
        merge: bool,

        /// Pause between locations in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Training corpus maintenance
    #[command(subcommand)]
    Dataset(DatasetCommands),

    /// Request an AQI estimate from the server
    Predict {
        #[arg(long, default_value_t = 0.0)]
        co: f64,
        #[arg(long, default_value_t = 0.0)]
        ozone: f64,
        #[arg(long, default_value_t = 0.0)]
        no2: f64,
        #[arg(long, default_value_t = 0.0)]
        pm25: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Check server health
    Health,
}

#[derive(Subcommand)]
pub enum DatasetCommands {
    /// Merge a snapshot file into the corpus, keeping the newest row per location
    Merge {
        /// Snapshot CSV to merge
        snapshot: PathBuf,
    },

    /// Show corpus statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Collect {
            locations,
            snapshot,
            merge,
            delay_ms,
        } => {
            let options = collect::CollectOptions {
                locations,
                snapshot,
                merge,
                dataset: cli.dataset,
                delay: Duration::from_millis(delay_ms),
            };
            collect::collect(options, cli.format).await?;
        }
        Commands::Dataset(dataset_cmd) => {
            let store = DatasetStore::new(cli.dataset);
            match dataset_cmd {
                DatasetCommands::Merge { snapshot } => dataset::merge(&store, &snapshot, cli.format)?,
                DatasetCommands::Stats => dataset::stats(&store, cli.format)?,
            }
        }
        Commands::Predict {
            co,
            ozone,
            no2,
            pm25,
            lat,
            lng,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            let features = FeatureVector::new(co, ozone, no2, pm25, lat, lng);
            predict::predict(&client, features, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            predict::health(&client, cli.format).await?;
        }
    }

    Ok(())
}
