//! Estimator capability used by the trainer
//!
//! Training is hidden behind [`Estimator`] so the lifecycle code never depends
//! on a particular algorithm. The shipped implementation is an L2-regularised
//! logistic regression fitted by batch gradient descent on standardized
//! features.

use crate::error::{ReadinessError, Result};
use crate::schema::NUM_FEATURES;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fits a classifier from a feature matrix and 0/1 labels
pub trait Estimator: Send + Sync {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LogisticModel>;

    /// Short name recorded in model metadata
    fn name(&self) -> &str;
}

/// Fitted parameters of a logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Per-feature mean learned on the training partition
    pub feature_means: Vec<f64>,
    /// Per-feature scale learned on the training partition
    pub feature_scales: Vec<f64>,
}

impl LogisticModel {
    /// Probability of the positive class for one canonical feature vector
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        let expected = self.coefficients.len();
        if features.len() != expected
            || self.feature_means.len() != expected
            || self.feature_scales.len() != expected
        {
            return Err(ReadinessError::Inference(format!(
                "Model expects {} features, got {}",
                expected,
                features.len()
            )));
        }

        let z = features
            .iter()
            .zip(&self.coefficients)
            .zip(self.feature_means.iter().zip(&self.feature_scales))
            .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
            .sum::<f64>()
            + self.intercept;

        let probability = sigmoid(z);
        if !probability.is_finite() {
            return Err(ReadinessError::Inference(
                "Model produced a non-finite probability".to_string(),
            ));
        }
        Ok(probability)
    }

    /// Fraction of rows whose thresholded prediction matches the label
    pub fn accuracy(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        if x.nrows() == 0 {
            return Err(ReadinessError::training("Cannot score an empty partition"));
        }
        let mut correct = 0usize;
        for (row, label) in x.outer_iter().zip(y.iter()) {
            let features: Vec<f64> = row.to_vec();
            let predicted = if self.predict_proba(&features)? >= 0.5 { 1.0 } else { 0.0 };
            if (predicted - label).abs() < 0.5 {
                correct += 1;
            }
        }
        Ok(correct as f64 / x.nrows() as f64)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression trained with batch gradient descent
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// L2 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tol: f64,
    pub learning_rate: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            max_iter: 2000,
            tol: 1e-6,
            learning_rate: 0.5,
        }
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }
}

impl Estimator for LogisticRegression {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LogisticModel> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(ReadinessError::training("No training rows"));
        }
        if n_samples != y.len() {
            return Err(ReadinessError::training(format!(
                "Label count {} does not match row count {}",
                y.len(),
                n_samples
            )));
        }
        if x.ncols() != NUM_FEATURES {
            return Err(ReadinessError::training(format!(
                "Expected {} feature columns, got {}",
                NUM_FEATURES,
                x.ncols()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ReadinessError::training("Training data contains non-finite values"));
        }

        let positives = y.iter().filter(|&&v| v >= 0.5).count();
        if positives == 0 || positives == n_samples {
            return Err(ReadinessError::training(
                "Training partition needs examples of both classes",
            ));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ReadinessError::training("Failed to compute feature means"))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        let scaled = (x - &means) / &scales;

        let mut weights = Array1::<f64>::zeros(NUM_FEATURES);
        let mut bias = 0.0;

        for _iter in 0..self.max_iter {
            let linear = scaled.dot(&weights) + bias;
            let predictions = linear.mapv(sigmoid);

            let errors = &predictions - y;
            let dw = (scaled.t().dot(&errors) / n_samples as f64) + (self.alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
            return Err(ReadinessError::training("Gradient descent diverged"));
        }

        Ok(LogisticModel {
            coefficients: weights.to_vec(),
            intercept: bias,
            feature_means: means.to_vec(),
            feature_scales: scales.to_vec(),
        })
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [8.5, 4.0, 3.0, 1.0, 92.0, 85.0],
            [8.0, 4.0, 2.0, 1.0, 88.0, 80.0],
            [7.8, 3.0, 3.0, 0.0, 85.0, 78.0],
            [9.1, 5.0, 4.0, 1.0, 95.0, 90.0],
            [5.0, 1.0, 0.0, 0.0, 60.0, 40.0],
            [5.5, 2.0, 0.0, 0.0, 65.0, 45.0],
            [6.0, 1.0, 1.0, 0.0, 55.0, 50.0],
            [4.8, 1.0, 0.0, 0.0, 58.0, 35.0],
        ];
        let y = array![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        (x, y)
    }

    #[test]
    fn test_fit_separates_classes() {
        let (x, y) = separable();
        let model = LogisticRegression::new().fit(&x, &y).unwrap();

        assert_eq!(model.coefficients.len(), NUM_FEATURES);
        assert!(model.accuracy(&x, &y).unwrap() >= 0.99);

        let strong = model.predict_proba(&[8.0, 4.0, 3.0, 1.0, 90.0, 80.0]).unwrap();
        let weak = model.predict_proba(&[5.0, 1.0, 0.0, 0.0, 60.0, 40.0]).unwrap();
        assert!(strong > 0.5, "strong profile probability {}", strong);
        assert!(weak < 0.5, "weak profile probability {}", weak);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let a = LogisticRegression::new().fit(&x, &y).unwrap();
        let b = LogisticRegression::new().fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = separable();
        let y = Array1::from(vec![1.0; x.nrows()]);
        let err = LogisticRegression::new().fit(&x, &y).unwrap_err();
        assert!(matches!(err, ReadinessError::Training(_)));
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let (mut x, y) = separable();
        x.column_mut(3).fill(1.0);
        let model = LogisticRegression::new().fit(&x, &y).unwrap();
        assert_eq!(model.feature_scales[3], 1.0);
        assert!(model.coefficients.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let (x, y) = separable();
        let model = LogisticRegression::new().fit(&x, &y).unwrap();
        let err = model.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ReadinessError::Inference(_)));
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let (x, y) = separable();
        let model = LogisticRegression::new().fit(&x, &y).unwrap();
        for extreme in [[0.0; 6], [1e6; 6], [-1e6; 6]] {
            let p = model.predict_proba(&extreme).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
