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

/// Print a single record as a one-row table, or as JSON
pub fn print_record<T: Tabled + Serialize>(record: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            let table = Table::new(std::iter::once(record))
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }
    Ok(())
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

/// Format a 0-1 fraction as a percentage
pub fn format_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(a) if a.is_finite() => format!("{:.1}%", a * 100.0),
        _ => "n/a".to_string(),
    }
}

/// Format a unix timestamp in UTC
pub fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Color a readiness label
pub fn color_label(label: &str) -> String {
    match label {
        "Ready" => label.green().bold().to_string(),
        "Needs Improvement" => label.yellow().bold().to_string(),
        _ => label.to_string(),
    }
}

/// Color a probability by how far it sits from the decision boundary
pub fn color_probability(probability: f64) -> String {
    let formatted = format!("{:.1}%", probability * 100.0);
    if probability >= 0.8 {
        formatted.green().to_string()
    } else if probability >= 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
