//! Active model inspection and retraining

use anyhow::Result;
use readiness_lib::ModelMetadata;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, RetrainResponse};
use crate::output::{
    format_accuracy, format_timestamp, print_record, print_success, print_warning, OutputFormat,
};

/// Row for the active model table
#[derive(Tabled, Serialize)]
struct ModelRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Trained")]
    trained_at: String,
    #[tabled(rename = "Rows")]
    training_rows: usize,
}

/// Show metadata for the model currently serving predictions
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let model: ModelMetadata = client.get("model").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        OutputFormat::Table => {
            let row = ModelRow {
                version: model.version.clone(),
                algorithm: model.algorithm.clone(),
                accuracy: format_accuracy(model.accuracy),
                trained_at: format_timestamp(model.trained_at),
                training_rows: model.training_rows,
            };
            print_record(&row, format)?;
            println!("\nFeature order: {}", model.feature_order.join(", "));
            if model.accuracy.is_none() {
                print_warning("Active model has no recorded held-out accuracy");
            }
        }
    }

    Ok(())
}

/// Upload a CSV and replace the active model
pub async fn retrain(client: &ApiClient, file: &Path, format: OutputFormat) -> Result<()> {
    let response: RetrainResponse = client.upload("retrain", file).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            print_success(&format!(
                "{} (held-out accuracy {})",
                response.message,
                format_accuracy(Some(response.accuracy))
            ));
        }
    }

    Ok(())
}
