//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// US EPA category for an AQI value
pub fn aqi_category(aqi: f64) -> &'static str {
    match aqi {
        a if a <= 50.0 => "Good",
        a if a <= 100.0 => "Moderate",
        a if a <= 150.0 => "Unhealthy for Sensitive Groups",
        a if a <= 200.0 => "Unhealthy",
        a if a <= 300.0 => "Very Unhealthy",
        _ => "Hazardous",
    }
}

/// AQI value with its category, colored by severity
pub fn color_aqi(aqi: f64) -> String {
    let formatted = format!("{:.2} ({})", aqi, aqi_category(aqi));
    match aqi {
        a if a <= 50.0 => formatted.green().to_string(),
        a if a <= 100.0 => formatted.yellow().to_string(),
        a if a <= 200.0 => formatted.red().to_string(),
        _ => formatted.magenta().bold().to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" | "yes" => status.green().to_string(),
        "degraded" | "warning" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" | "no" => status.red().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aqi_category_boundaries() {
        assert_eq!(aqi_category(0.0), "Good");
        assert_eq!(aqi_category(50.0), "Good");
        assert_eq!(aqi_category(50.01), "Moderate");
        assert_eq!(aqi_category(150.0), "Unhealthy for Sensitive Groups");
        assert_eq!(aqi_category(301.0), "Hazardous");
        // Predictions are not clamped; negatives still render
        assert_eq!(aqi_category(-4.0), "Good");
    }

    #[test]
    fn test_color_aqi_keeps_value() {
        colored::control::set_override(false);
        assert_eq!(color_aqi(46.96), "46.96 (Good)");
    }
}
