//! Holder of the active model
//!
//! Readers take an `Arc` snapshot and release the lock immediately, so a
//! promotion only waits for in-progress pointer clones, never for inference.
//! A reader keeps using the snapshot it captured even if a promotion lands
//! mid-request.

use crate::model::TrainedModel;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

pub struct ModelRegistry {
    active: RwLock<Arc<TrainedModel>>,
}

impl ModelRegistry {
    pub fn new(initial: TrainedModel) -> Self {
        Self {
            active: RwLock::new(Arc::new(initial)),
        }
    }

    /// Snapshot of the model currently serving requests
    pub fn get_active(&self) -> Arc<TrainedModel> {
        // The guarded value is a plain pointer, so a poisoned lock still
        // holds a fully-formed model.
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the active model, returning the one it displaced
    pub fn promote(&self, candidate: Arc<TrainedModel>) -> Arc<TrainedModel> {
        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, candidate.clone())
        };

        info!(
            old_version = %previous.version(),
            new_version = %candidate.version(),
            "Active model promoted"
        );
        previous
    }

    pub fn active_version(&self) -> String {
        self.get_active().version().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::LogisticModel;
    use crate::schema::FeatureVector;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn model_with_bias(bias: f64) -> TrainedModel {
        TrainedModel::new(
            LogisticModel {
                coefficients: vec![0.0; 6],
                intercept: bias,
                feature_means: vec![0.0; 6],
                feature_scales: vec![1.0; 6],
            },
            "logistic_regression",
            None,
            0,
        )
    }

    fn sample_profile() -> FeatureVector {
        FeatureVector {
            cgpa: 7.0,
            dsa_rating: 3,
            projects_count: 2,
            internship: false,
            attendance: 80.0,
            aptitude_score: 70.0,
        }
    }

    #[test]
    fn test_promote_swaps_reference() {
        let registry = ModelRegistry::new(model_with_bias(-2.0));
        let before = registry.get_active();

        let candidate = Arc::new(model_with_bias(2.0));
        let displaced = registry.promote(candidate.clone());

        assert!(Arc::ptr_eq(&displaced, &before));
        assert!(Arc::ptr_eq(&registry.get_active(), &candidate));
    }

    #[test]
    fn test_snapshot_survives_promotion() {
        let registry = ModelRegistry::new(model_with_bias(-2.0));
        let snapshot = registry.get_active();
        let p_before = snapshot.predict_proba(&sample_profile()).unwrap();

        registry.promote(Arc::new(model_with_bias(2.0)));

        assert_eq!(snapshot.predict_proba(&sample_profile()).unwrap(), p_before);
        assert!(registry.get_active().predict_proba(&sample_profile()).unwrap() > 0.5);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_model() {
        let old = Arc::new(model_with_bias(-3.0));
        let new = Arc::new(model_with_bias(3.0));
        let old_p = old.predict_proba(&sample_profile()).unwrap();
        let new_p = new.predict_proba(&sample_profile()).unwrap();

        let registry = Arc::new(ModelRegistry::new((*old).clone()));
        let promoted = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let promoted = promoted.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let seen_after_promote = promoted.load(Ordering::SeqCst);
                        let model = registry.get_active();
                        let p = model.predict_proba(&sample_profile()).unwrap();
                        assert!(p == old_p || p == new_p, "torn read: {}", p);
                        // The same snapshot always answers the same way.
                        assert_eq!(model.predict_proba(&sample_profile()).unwrap(), p);
                        if seen_after_promote {
                            assert_eq!(p, new_p);
                        }
                    }
                })
            })
            .collect();

        registry.promote(new.clone());
        promoted.store(true, Ordering::SeqCst);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.active_version(), new.version());
    }
}
