//! Candidate model training
//!
//! Splits a dataset into train and held-out partitions with a seeded shuffle,
//! fits a candidate through the configured [`Estimator`], and scores it on the
//! held-out rows. Nothing here touches the registry or the store.

use crate::dataset::Dataset;
use crate::error::{ReadinessError, Result};
use crate::estimator::{Estimator, LogisticRegression};
use crate::model::TrainedModel;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default fraction of rows held out for evaluation
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// Default shuffle seed
pub const DEFAULT_SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: DEFAULT_TEST_RATIO,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl SplitConfig {
    /// Row indices for the (train, test) partitions.
    ///
    /// The test partition holds `ceil(n * test_ratio)` rows.
    pub fn split(&self, n_rows: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let n_test = ((n_rows as f64) * self.test_ratio).ceil() as usize;
        let n_test = n_test.min(n_rows);
        let train = indices.split_off(n_test);
        (train, indices)
    }
}

/// Result of a successful training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Clone)]
pub struct Trainer {
    estimator: Arc<dyn Estimator>,
    split: SplitConfig,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(Arc::new(LogisticRegression::default()), SplitConfig::default())
    }
}

impl Trainer {
    pub fn new(estimator: Arc<dyn Estimator>, split: SplitConfig) -> Self {
        Self { estimator, split }
    }

    /// Fit and evaluate a candidate model
    pub fn retrain(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(ReadinessError::EmptyDataset);
        }

        let start = Instant::now();
        let (train_idx, test_idx) = self.split.split(dataset.len());
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(ReadinessError::training(format!(
                "Dataset of {} rows is too small for a {:.0}/{:.0} split",
                dataset.len(),
                (1.0 - self.split.test_ratio) * 100.0,
                self.split.test_ratio * 100.0
            )));
        }

        let (x_train, y_train) = dataset.to_matrices(&train_idx)?;
        let (x_test, y_test) = dataset.to_matrices(&test_idx)?;
        debug!(
            train_rows = train_idx.len(),
            test_rows = test_idx.len(),
            seed = self.split.seed,
            "Dataset split"
        );

        let classifier = self.estimator.fit(&x_train, &y_train)?;
        let accuracy = classifier.accuracy(&x_test, &y_test)?;

        let model = TrainedModel::new(
            classifier,
            self.estimator.name(),
            Some(accuracy),
            train_idx.len(),
        );

        info!(
            version = %model.version(),
            accuracy = accuracy,
            train_rows = train_idx.len(),
            test_rows = test_idx.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Candidate model trained"
        );

        Ok(TrainingOutcome {
            model,
            accuracy,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
        })
    }
}
