//! API client for the readiness server

use anyhow::{Context, Result};
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// API client for the readiness server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            // Retrains fit a model inside the request
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        decode(response).await
    }

    /// Upload a file as the `file` field of a multipart form
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, file: &Path) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request")?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        anyhow::bail!("API error ({}): {}", status, message);
    }

    response.json().await.context("Failed to parse response")
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainResponse {
    pub message: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use readiness_lib::{FeatureVector, ModelMetadata, PredictionResponse};
    use std::io::Write;

    fn profile() -> FeatureVector {
        FeatureVector {
            cgpa: 8.1,
            dsa_rating: 4,
            projects_count: 2,
            internship: true,
            attendance: 88.0,
            aptitude_score: 76.0,
        }
    }

    #[tokio::test]
    async fn test_post_decodes_probability_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "dsaRating": 4,
                "internship": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"probability":0.83,"label":"Ready"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response: PredictionResponse = client.post("predict", &profile()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            response,
            PredictionResponse::Probability {
                probability: 0.83,
                label: "Ready".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_post_decodes_scored_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"score":64.0,"status":"Needs Improvement","explanations":["DSA rating below 3 reduces readiness"]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response: PredictionResponse = client.post("predict", &profile()).await.unwrap();
        assert!(matches!(response, PredictionResponse::Scored { ref status, .. } if status == "Needs Improvement"));
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Missing required fields: attendance"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<PredictionResponse, _>("predict", &profile())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("Missing required fields: attendance"));
    }

    #[tokio::test]
    async fn test_get_model_metadata() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/model")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "version": "lr-0123456789ab",
                    "algorithm": "logistic_regression",
                    "accuracy": 0.9,
                    "trained_at": 1_700_000_000,
                    "training_rows": 80,
                    "feature_order": ["cgpa", "dsaRating", "projectsCount", "internship", "attendance", "aptitudeScore"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let model: ModelMetadata = client.get("model").await.unwrap();
        assert_eq!(model.version, "lr-0123456789ab");
        assert_eq!(model.accuracy, Some(0.9));
        assert_eq!(model.feature_order.len(), 6);
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/retrain")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(mockito::Matcher::Regex(
                r#"name="file"; filename="students.csv""#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Model retrained successfully","accuracy":0.875}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cgpa,dsaRating,projectsCount,internship,attendance,aptitudeScore,placed").unwrap();
        writeln!(file, "8.0,4,3,1,90,80,1").unwrap();

        let client = ApiClient::new(&server.url()).unwrap();
        let response: RetrainResponse = client.upload("retrain", &path).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.accuracy, 0.875);
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails_before_request() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = client
            .upload::<RetrainResponse>("retrain", Path::new("/nonexistent/students.csv"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
