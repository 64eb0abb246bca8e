//! Shared model handle: load-once access to a classifier artifact.
//!
//! The handle is created at startup and passed to whoever needs the model;
//! there is no process-wide global. The first successful load is cached and
//! shared read-only afterwards. A failed load is not cached, so a later
//! request retries (useful when the artifact is deployed after the process
//! starts). Concurrent first callers block on the same initialization.

use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::adapters::logistic::{Integrity, LogisticModel, ModelError};
use crate::domain::FeatureVector;
use crate::ports::{Classifier, ClassifierError, Labeler, ProbabilityEstimator};

type Loader<M> = Box<dyn Fn(&Path) -> Result<M, ModelError> + Send + Sync>;

/// Lazily loaded, immutable-after-load classifier.
pub struct SharedModel<M = LogisticModel> {
    path: PathBuf,
    loader: Loader<M>,
    cell: OnceCell<M>,
}

impl SharedModel<LogisticModel> {
    /// Handle for a logistic regression artifact.
    #[must_use]
    pub fn logistic(path: impl Into<PathBuf>, integrity: Integrity) -> Self {
        Self::with_loader(path, move |p| LogisticModel::load(p, integrity))
    }
}

impl<M> SharedModel<M> {
    /// Handle with a custom loader.
    pub fn with_loader<F>(path: impl Into<PathBuf>, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<M, ModelError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// Handle around an already loaded model.
    pub fn preloaded(path: impl Into<PathBuf>, model: M) -> Self {
        let path = path.into();
        let reported = path.clone();
        let handle = Self::with_loader(path, move |_| {
            Err(ModelError::Format(format!("{reported:?} was preloaded")))
        });
        // A fresh cell cannot already be set.
        let _ = handle.cell.set(model);
        handle
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the model, loading it on first use.
    ///
    /// # Errors
    /// Returns the loader's error; the next call tries again.
    pub fn get(&self) -> Result<&M, ModelError> {
        self.cell.get_or_try_init(|| {
            tracing::info!("Loading model from {:?}", self.path);
            (self.loader)(&self.path).map_err(|e| {
                tracing::warn!("Model load failed: {e}");
                e
            })
        })
    }
}

impl<M> fmt::Debug for SharedModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModel")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl<M: Classifier> Labeler for SharedModel<M> {
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        self.get()
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?
            .predict(features)
    }
}

impl<M: Classifier> Classifier for SharedModel<M> {
    fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
        self.get().ok()?.probability_estimator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Constant(u8);

    impl Labeler for Constant {
        fn predict(&self, _features: &FeatureVector) -> Result<u8, ClassifierError> {
            Ok(self.0)
        }
    }

    impl Classifier for Constant {}

    fn features() -> FeatureVector {
        FeatureVector::from([0.0; crate::domain::FEATURE_COUNT])
    }

    #[test]
    fn test_loads_once_under_concurrent_access() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let model = Arc::new(SharedModel::with_loader("unused", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Constant(1))
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || model.predict(&features()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("thread").expect("predict"), 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(model.is_loaded());
    }

    #[test]
    fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let model = SharedModel::with_loader("flaky.json", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ModelError::Format("not yet deployed".into()))
            } else {
                Ok(Constant(0))
            }
        });

        let err = model.predict(&features()).expect_err("first load fails");
        assert!(matches!(err, ClassifierError::Unavailable(_)));
        assert!(!model.is_loaded());

        assert_eq!(model.predict(&features()).expect("second load"), 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_artifact_reports_unavailable() {
        let model = SharedModel::logistic("/nonexistent/cardio_model.json", Integrity::Optional);
        assert!(matches!(
            model.predict(&features()),
            Err(ClassifierError::Unavailable(_))
        ));
        assert!(model.probability_estimator().is_none());
    }

    #[test]
    fn test_preloaded_handle() {
        let model = SharedModel::preloaded("memory", Constant(1));
        assert!(model.is_loaded());
        assert_eq!(model.predict(&features()).expect("predict"), 1);
    }
}
