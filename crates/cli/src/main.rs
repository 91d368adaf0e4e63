//! Placement Readiness CLI
//!
//! Trains model artifacts offline and talks to a running readiness server
//! to score profiles, retrain, and inspect the active model.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{model, predict, train};
use readiness_lib::{trainer, FeatureVector, SplitConfig};
use std::path::PathBuf;

/// Placement Readiness CLI
#[derive(Parser)]
#[command(name = "readiness")]
#[command(author, version, about = "CLI for the Placement Readiness service", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via READINESS_API_URL env var)
    #[arg(long, env = "READINESS_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model from a CSV file and write the artifact locally
    Train {
        /// Training data with a header row
        #[arg(long, short)]
        data: PathBuf,

        /// Where to write the model artifact
        #[arg(long, short, default_value = "placement_model.json")]
        output: PathBuf,

        /// Shuffle seed for the train/test split
        #[arg(long, default_value_t = trainer::DEFAULT_SPLIT_SEED)]
        seed: u64,

        /// Fraction of rows held out for accuracy
        #[arg(long, default_value_t = trainer::DEFAULT_TEST_RATIO)]
        test_ratio: f64,
    },

    /// Score a student profile against the active model
    Predict {
        #[arg(long)]
        cgpa: f64,

        #[arg(long)]
        dsa_rating: i64,

        #[arg(long)]
        projects_count: u32,

        /// Student has completed an internship
        #[arg(long)]
        internship: bool,

        /// Attendance percentage
        #[arg(long)]
        attendance: f64,

        #[arg(long)]
        aptitude_score: f64,
    },

    /// Upload a CSV and retrain the server's model
    Retrain {
        /// CSV file with every feature column and `placed`
        file: PathBuf,
    },

    /// Show the active model
    Model,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            output,
            seed,
            test_ratio,
        } => {
            train::train(&data, &output, SplitConfig { test_ratio, seed }, cli.format)?;
        }
        Commands::Predict {
            cgpa,
            dsa_rating,
            projects_count,
            internship,
            attendance,
            aptitude_score,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            let profile = FeatureVector {
                cgpa,
                dsa_rating,
                projects_count,
                internship,
                attendance,
                aptitude_score,
            };
            predict::predict(&client, profile, cli.format).await?;
        }
        Commands::Retrain { file } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            model::retrain(&client, &file, cli.format).await?;
        }
        Commands::Model => {
            let client = client::ApiClient::new(&cli.api_url)?;
            model::show_model(&client, cli.format).await?;
        }
    }

    Ok(())
}
