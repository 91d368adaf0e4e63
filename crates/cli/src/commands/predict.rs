//! Prediction against a running server

use anyhow::Result;
use readiness_lib::{FeatureVector, PredictionResponse};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_label, color_probability, print_info, OutputFormat};

#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "Readiness")]
    label: String,
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Readiness")]
    status: String,
}

/// Score one student profile
pub async fn predict(client: &ApiClient, profile: FeatureVector, format: OutputFormat) -> Result<()> {
    let response: PredictionResponse = client.post("predict", &profile).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => match response {
            PredictionResponse::Probability { probability, label } => {
                let row = PredictionRow {
                    probability: color_probability(probability),
                    label: color_label(&label),
                };
                let table = tabled::Table::new([row])
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
            PredictionResponse::Scored {
                score,
                status,
                explanations,
            } => {
                let row = ScoreRow {
                    score: format!("{:.1}", score),
                    status: color_label(&status),
                };
                let table = tabled::Table::new([row])
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
                for note in &explanations {
                    print_info(note);
                }
            }
        },
    }

    Ok(())
}
