//! Offline training: CSV in, model artifact out

use anyhow::{bail, Context, Result};
use readiness_lib::{Dataset, LogisticRegression, ModelStore, SplitConfig, Trainer, TrainingOutcome};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::output::{format_accuracy, print_info, print_success, OutputFormat};

#[derive(Serialize)]
struct TrainSummary<'a> {
    version: &'a str,
    accuracy: f64,
    train_rows: usize,
    test_rows: usize,
    output: String,
}

/// Fit a model on `data` and write the artifact the server loads at startup
pub fn train_model(data: &Path, output: &Path, split: SplitConfig) -> Result<TrainingOutcome> {
    if !(split.test_ratio > 0.0 && split.test_ratio < 1.0) {
        bail!(
            "test ratio must lie strictly between 0 and 1, got {}",
            split.test_ratio
        );
    }

    let file = File::open(data).with_context(|| format!("Failed to open {}", data.display()))?;
    let dataset = Dataset::from_csv_reader(file)
        .with_context(|| format!("Failed to read dataset {}", data.display()))?;

    let trainer = Trainer::new(Arc::new(LogisticRegression::default()), split);
    let outcome = trainer.retrain(&dataset).context("Training failed")?;

    ModelStore::new(output)
        .save(&outcome.model)
        .with_context(|| format!("Failed to write model to {}", output.display()))?;

    Ok(outcome)
}

pub fn train(data: &Path, output: &Path, split: SplitConfig, format: OutputFormat) -> Result<()> {
    let outcome = train_model(data, output, split)?;

    match format {
        OutputFormat::Json => {
            let summary = TrainSummary {
                version: outcome.model.version(),
                accuracy: outcome.accuracy,
                train_rows: outcome.train_rows,
                test_rows: outcome.test_rows,
                output: output.display().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            print_info(&format!(
                "Trained on {} rows, evaluated on {}",
                outcome.train_rows, outcome.test_rows
            ));
            print_success(&format!(
                "Model {} written to {} (accuracy {})",
                outcome.model.version(),
                output.display(),
                format_accuracy(Some(outcome.accuracy))
            ));
        }
    }

    Ok(())
}
