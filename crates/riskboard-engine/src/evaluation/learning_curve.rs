//! Cross-validated learning curves.
//!
//! The real computation refits the classifier for every (training size,
//! fold) pair, so it is the most expensive operation in the engine. The grid
//! is evaluated with rayon and the whole computation runs on a worker thread
//! under a wall-clock budget; expiry counts as a computation failure.
//!
//! A bounded computation gets its own thread pool and a cancel flag, so a
//! timed-out grid neither occupies the global rayon pool nor keeps starting
//! new refits.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use itertools_num::linspace;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::config::LearningCurveConfig;
use crate::data_handling::Dataset;
use crate::error::ComputeError;
use crate::evaluation::metrics::accuracy_score;
use crate::evaluation::synthetic::generate_learning_curve;
use crate::evaluation::Evaluated;
use crate::models::utils::binary_classes;
use crate::models::{Capabilities, Capability, Classifier};
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningCurve {
    pub sizes: Vec<usize>,
    pub train_scores: Vec<f64>,
    pub val_scores: Vec<f64>,
}

impl LearningCurve {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        self.sizes.len() == self.train_scores.len() && self.sizes.len() == self.val_scores.len()
    }

    pub fn sizes_strictly_ascending(&self) -> bool {
        self.sizes.windows(2).all(|w| w[0] < w[1])
    }
}

/// Absolute training sizes for `config.points` fractions evenly spaced over
/// `[min_fraction, max_fraction]` of `n_train_max`, clipped to
/// `[1, n_train_max]` and deduplicated.
pub fn training_sizes(config: &LearningCurveConfig, n_train_max: usize) -> Result<Vec<usize>, ComputeError> {
    let mut sizes: Vec<usize> = linspace(config.min_fraction, config.max_fraction, config.points)
        // nudge so 1.0 * n does not floor to n - 1
        .map(|fraction| ((fraction * n_train_max as f64) + 1e-9).floor() as usize)
        .map(|size| size.max(1).min(n_train_max))
        .collect();
    sizes.sort_unstable();
    sizes.dedup();

    match sizes.first() {
        None => Err(ComputeError::InvalidParameter("no training sizes requested".to_string())),
        Some(0) => Err(ComputeError::InvalidParameter(format!(
            "folds leave no training rows for fraction {}",
            config.min_fraction
        ))),
        Some(_) => Ok(sizes),
    }
}

/// Stands in for a refit on a training subset that holds one class.
struct ConstantLabel(i64);

impl Classifier for ConstantLabel {
    fn name(&self) -> &str {
        "constant"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Ok(Array1::from_elem(x.nrows(), self.0))
    }
}

fn refit_subset(
    model: &dyn Classifier,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, i64>,
) -> Result<Box<dyn Classifier>, ComputeError> {
    match binary_classes(&y)?.as_slice() {
        &[only] => Ok(Box::new(ConstantLabel(only))),
        _ => model.refit(x, y),
    }
}

/// Fit on a prefix of each fold's training rows and score train / held-out
/// accuracy, averaged over folds per training size.
///
/// A prefix holding a single class is scored as a constant predictor of
/// that class rather than refitted.
pub fn compute_learning_curve(
    model: &dyn Classifier,
    data: &Dataset,
    config: &LearningCurveConfig,
) -> Result<LearningCurve, ComputeError> {
    run_learning_curve(model, data, config, &AtomicBool::new(false))
}

/// Grid cells check `cancel` before starting; once it is set the remaining
/// cells fail fast with [`ComputeError::Cancelled`].
pub(crate) fn run_learning_curve(
    model: &dyn Classifier,
    data: &Dataset,
    config: &LearningCurveConfig,
    cancel: &AtomicBool,
) -> Result<LearningCurve, ComputeError> {
    if !model.capabilities().refit {
        return Err(ComputeError::Unsupported(Capability::Refit));
    }

    let folds = data.stratified_folds(config.folds)?;
    let n_train_max = folds
        .iter()
        .map(|fold| fold.train.len())
        .min()
        .ok_or(ComputeError::EmptyInput("folds"))?;
    let sizes = training_sizes(config, n_train_max)?;

    log::debug!(
        "Learning curve for {}: sizes {:?} over {} folds",
        model.name(),
        sizes,
        folds.len()
    );

    let grid: Vec<(usize, usize)> = (0..sizes.len())
        .flat_map(|s| (0..folds.len()).map(move |f| (s, f)))
        .collect();

    let scores = grid
        .par_iter()
        .map(|&(s, f)| -> Result<(usize, f64, f64), ComputeError> {
            if cancel.load(Ordering::Relaxed) {
                return Err(ComputeError::Cancelled);
            }
            let fold = &folds[f];
            let subset = &fold.train[..sizes[s]];
            let x_train = data.x().select(Axis(0), subset);
            let y_train = data.y().select(Axis(0), subset);
            let (x_test, y_test) = data.select_rows(&fold.test);

            let fitted = refit_subset(model, x_train.view(), y_train.view())?;
            let train_pred = fitted.predict(x_train.view())?;
            let test_pred = fitted.predict(x_test.view())?;
            let train_score = accuracy_score(y_train.view(), train_pred.view())?;
            let val_score = accuracy_score(y_test.view(), test_pred.view())?;
            Ok((s, train_score, val_score))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut train_scores = Vec::with_capacity(sizes.len());
    let mut val_scores = Vec::with_capacity(sizes.len());
    for s in 0..sizes.len() {
        let train: Vec<f64> = scores.iter().filter(|r| r.0 == s).map(|r| r.1).collect();
        let val: Vec<f64> = scores.iter().filter(|r| r.0 == s).map(|r| r.2).collect();
        train_scores.push(train.iter().mean());
        val_scores.push(val.iter().mean());
    }

    Ok(LearningCurve {
        sizes,
        train_scores,
        val_scores,
    })
}

/// Run [`compute_learning_curve`] on a worker thread with its own rayon
/// pool, giving up after `config.timeout_ms`. On expiry the worker is told
/// to stop: refits already running finish, no new ones start, and the
/// result is discarded.
pub fn compute_learning_curve_bounded(
    model: Arc<dyn Classifier>,
    data: Arc<Dataset>,
    config: &LearningCurveConfig,
) -> Result<LearningCurve, ComputeError> {
    let Some(timeout_ms) = config.timeout_ms else {
        return compute_learning_curve(model.as_ref(), &data, config);
    };
    let timeout = Duration::from_millis(timeout_ms);

    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let worker_config = config.clone();
    thread::Builder::new()
        .name("learning-curve".to_string())
        .spawn(move || {
            let result = ThreadPoolBuilder::new()
                .thread_name(|i| format!("learning-curve-{}", i))
                .build()
                .map_err(|e| ComputeError::Worker(e.to_string()))
                .and_then(|pool| {
                    pool.install(|| {
                        run_learning_curve(model.as_ref(), &data, &worker_config, &worker_cancel)
                    })
                });
            // receiver is gone if we already timed out
            let _ = tx.send(result);
        })
        .map_err(|e| ComputeError::Worker(e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            Err(ComputeError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ComputeError::Worker(
            "learning curve worker exited without a result".to_string(),
        )),
    }
}

pub fn calculate_learning_curve(
    model: Option<&Arc<dyn Classifier>>,
    data: Option<&Arc<Dataset>>,
    config: &LearningCurveConfig,
    rng: &mut dyn RandomSource,
) -> Evaluated<LearningCurve> {
    let (Some(model), Some(data)) = (model, data) else {
        return Evaluated::synthetic(generate_learning_curve(rng));
    };
    match compute_learning_curve_bounded(Arc::clone(model), Arc::clone(data), config) {
        Ok(curve) => Evaluated::real(curve),
        Err(err) => {
            log::warn!("Error calculating learning curve for {}: {}", model.name(), err);
            Evaluated::synthetic(generate_learning_curve(rng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn default_fractions_give_five_ascending_sizes() {
        let sizes = training_sizes(&LearningCurveConfig::default(), 100).unwrap();
        assert_eq!(sizes.len(), 5);
        assert_eq!(sizes[0], 10);
        assert_eq!(sizes[4], 100);
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_sizes_collapse() {
        let sizes = training_sizes(&LearningCurveConfig::default(), 12).unwrap();
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*sizes.last().unwrap(), 12);
    }

    #[test]
    fn smallest_size_is_clipped_to_one_row() {
        // 0.1 * 5 floors to 0
        let sizes = training_sizes(&LearningCurveConfig::default(), 5).unwrap();
        assert_eq!(sizes.first(), Some(&1));
        assert_eq!(sizes.last(), Some(&5));
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn no_training_rows_is_an_error() {
        assert!(training_sizes(&LearningCurveConfig::default(), 0).is_err());
    }

    /// Refits a constant predictor of the majority label and counts calls.
    struct CountingRefit(AtomicUsize);

    impl Classifier for CountingRefit {
        fn capabilities(&self) -> Capabilities {
            Capabilities::PREDICT_ONLY.with(Capability::Refit)
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
            Ok(Array1::zeros(x.nrows()))
        }

        fn refit(
            &self,
            _x: ArrayView2<'_, f64>,
            _y: ArrayView1<'_, i64>,
        ) -> Result<Box<dyn Classifier>, ComputeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ConstantLabel(0)))
        }
    }

    fn alternating(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| (i % 2) as i64);
        Dataset::unnamed(x, y).unwrap()
    }

    #[test]
    fn cancelled_grid_starts_no_refits() {
        let model = CountingRefit(AtomicUsize::new(0));
        let cancel = AtomicBool::new(true);
        let result = run_learning_curve(&model, &alternating(30), &LearningCurveConfig::default(), &cancel);
        assert!(matches!(result, Err(ComputeError::Cancelled)));
        assert_eq!(model.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_class_prefixes_are_scored_without_refit() {
        // rows sorted by class: the smallest prefixes hold only label 0
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(30, |i| if i < 15 { 0 } else { 1 });
        let data = Dataset::unnamed(x, y).unwrap();
        let model = CountingRefit(AtomicUsize::new(0));

        let curve = compute_learning_curve(&model, &data, &LearningCurveConfig::default()).unwrap();
        assert!(curve.is_aligned());
        assert_eq!(curve.train_scores[0], 1.0);
        assert!(model.0.load(Ordering::SeqCst) < curve.len() * 3);
    }
}
