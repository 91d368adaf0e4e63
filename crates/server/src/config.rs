//! Server configuration

use anyhow::{bail, Context, Result};
use readiness_lib::{trainer, LogisticRegression, ResponseMode, ServiceConfig, SplitConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model artifact, loaded at startup and replaced on every retrain
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default = "default_split_seed")]
    pub split_seed: u64,

    /// Fraction of uploaded rows held out for accuracy
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Gradient descent step size for retraining
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// L2 regularization strength
    #[serde(default = "default_l2_alpha")]
    pub l2_alpha: f64,

    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("placement_model.json")
}

fn default_split_seed() -> u64 {
    trainer::DEFAULT_SPLIT_SEED
}

fn default_test_ratio() -> f64 {
    trainer::DEFAULT_TEST_RATIO
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_learning_rate() -> f64 {
    LogisticRegression::default().learning_rate
}

fn default_max_iter() -> usize {
    LogisticRegression::default().max_iter
}

fn default_l2_alpha() -> f64 {
    LogisticRegression::default().alpha
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

impl ServerConfig {
    /// Load configuration from an optional `readiness.*` file, overridden by
    /// `READINESS_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("readiness").required(false))
            .add_source(config::Environment::with_prefix("READINESS").try_parsing(true))
            .build()
            .context("failed to read configuration sources")?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> Result<Self> {
        let parsed: ServerConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            bail!(
                "test_ratio must lie strictly between 0 and 1, got {}",
                self.test_ratio
            );
        }
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be positive");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        if self.max_iter == 0 {
            bail!("max_iter must be positive");
        }
        if !(self.l2_alpha.is_finite() && self.l2_alpha >= 0.0) {
            bail!("l2_alpha must be non-negative, got {}", self.l2_alpha);
        }
        Ok(())
    }

    /// Estimator used for every retrain
    pub fn estimator(&self) -> LogisticRegression {
        LogisticRegression::new()
            .with_alpha(self.l2_alpha)
            .with_max_iter(self.max_iter)
            .with_learning_rate(self.learning_rate)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            model_path: self.model_path.clone(),
            response_mode: self.response_mode,
            split: SplitConfig {
                test_ratio: self.test_ratio,
                seed: self.split_seed,
            },
            instance: self.instance_name.clone(),
        }
    }
}
