//! Every real computation path must degrade to synthetic output instead of
//! surfacing an error.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use riskboard_engine::config::{EngineConfig, LearningCurveConfig};
use riskboard_engine::data_handling::Dataset;
use riskboard_engine::evaluation::confusion::calculate_confusion_matrix;
use riskboard_engine::evaluation::learning_curve::{
    calculate_learning_curve, compute_learning_curve_bounded,
};
use riskboard_engine::evaluation::metrics::{calculate_metrics, compute_metrics};
use riskboard_engine::evaluation::synthetic::CONFUSION_RANGES;
use riskboard_engine::evaluation::Provenance;
use riskboard_engine::models::knn::KNearestNeighbors;
use riskboard_engine::models::logistic::{LogisticParams, LogisticRegression};
use riskboard_engine::models::Classifier;
use riskboard_engine::random::ScriptedSource;
use riskboard_engine::registry::ModelRegistry;
use riskboard_engine::risk::{synthesize_monthly_trend, RiskTierCounts, Stratification};
use riskboard_engine::{ComputeError, ReportEngine};

use common::{labelled_dataset, separable_dataset, Failing, SlowRefit};

fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

// ---------------------------------------------------------------------------
// Failing classifier
// ---------------------------------------------------------------------------

#[test]
fn failing_model_report_is_fully_synthetic() {
    let registry = ModelRegistry::new().with_model("random_forest", Arc::new(Failing));
    let engine = ReportEngine::new(EngineConfig::default(), registry, Some(separable_dataset(30)));

    let report = engine.get_report_with("random_forest", &mut seeded(1)).unwrap();
    assert_eq!(report.sources.metrics, Provenance::Synthetic);
    assert_eq!(report.sources.confusion_matrix, Provenance::Synthetic);
    assert_eq!(report.sources.learning_curve, Provenance::Synthetic);

    // the fallback keeps its own ranges, not the catalog baseline
    assert!((0.85..0.95).contains(&report.metrics.accuracy));
    assert_eq!(report.confusion_matrix.size(), 3);
    assert_eq!(report.learning_curve.len(), 6);
}

#[test]
fn failing_model_comparison_uses_baseline() {
    let registry = ModelRegistry::new().with_model("random_forest", Arc::new(Failing));
    let engine = ReportEngine::new(EngineConfig::default(), registry, Some(separable_dataset(30)));

    let rows = engine.get_comparison_with(&mut seeded(2));
    let rf = rows.iter().find(|r| r.id == "random_forest").unwrap();
    assert_eq!(rf.accuracy, 0.800);
}

#[test]
fn failing_risk_model_falls_back_to_labels() {
    let registry = ModelRegistry::new().with_model("random_forest", Arc::new(Failing));
    let engine = ReportEngine::new(
        EngineConfig::default(),
        registry,
        Some(labelled_dataset(40, 10)),
    );
    let stats = engine.get_population_stats_with(&mut seeded(3)).unwrap();
    assert_eq!(stats.stratification, Stratification::Label);
    assert_eq!(stats.risk_distribution.total(), 40);
    assert_eq!(stats.risk_distribution.high, 10);
}

#[test]
fn calculators_go_synthetic_without_model_or_data() {
    let data = separable_dataset(12);
    let mut rng = seeded(4);
    assert!(!calculate_metrics(None, Some(&data), &mut rng).is_real());
    assert!(!calculate_confusion_matrix(None, None, &mut rng).is_real());

    let data = Arc::new(data);
    let lc = calculate_learning_curve(None, Some(&data), &LearningCurveConfig::default(), &mut rng);
    assert_eq!(lc.source, Provenance::Synthetic);
}

#[test]
fn shape_mismatch_falls_back() {
    // fitted on two columns, evaluated on three
    let train = separable_dataset(12);
    let model =
        LogisticRegression::fit(LogisticParams::default(), train.x().view(), train.y().view()).unwrap();
    let data = labelled_dataset(12, 6);
    let metrics = calculate_metrics(Some(&model as &dyn Classifier), Some(&data), &mut seeded(5));
    assert_eq!(metrics.source, Provenance::Synthetic);
    assert!(metrics.value.is_within_unit_range());
}

// ---------------------------------------------------------------------------
// Learning curve timeout
// ---------------------------------------------------------------------------

#[test]
fn slow_learning_curve_times_out() {
    let model: Arc<dyn Classifier> = Arc::new(SlowRefit(Duration::from_millis(400)));
    let data: Arc<Dataset> = Arc::new(separable_dataset(30));
    let config = LearningCurveConfig {
        timeout_ms: Some(50),
        ..LearningCurveConfig::default()
    };

    let err = compute_learning_curve_bounded(Arc::clone(&model), Arc::clone(&data), &config)
        .unwrap_err();
    assert!(matches!(err, ComputeError::Timeout(_)));

    let lc = calculate_learning_curve(Some(&model), Some(&data), &config, &mut seeded(6));
    assert_eq!(lc.source, Provenance::Synthetic);
    assert_eq!(lc.value.sizes, vec![10, 30, 50, 70, 90, 100]);
}

#[test]
fn timed_out_curve_does_not_hold_up_later_predictions() {
    let slow: Arc<dyn Classifier> = Arc::new(SlowRefit(Duration::from_millis(300)));
    let data: Arc<Dataset> = Arc::new(separable_dataset(60));
    let config = LearningCurveConfig {
        timeout_ms: Some(100),
        ..LearningCurveConfig::default()
    };
    let err = compute_learning_curve_bounded(slow, Arc::clone(&data), &config).unwrap_err();
    assert!(matches!(err, ComputeError::Timeout(_)));

    // abandoned refits are still sleeping; the knn vote runs on the global pool
    let knn = KNearestNeighbors::fit(3, data.x().view(), data.y().view()).unwrap();
    let started = Instant::now();
    let metrics = compute_metrics(&knn, &data).unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(metrics.accuracy, 1.0);
}

#[test]
fn fast_learning_curve_within_budget_is_real() {
    let model: Arc<dyn Classifier> = Arc::new(SlowRefit(Duration::from_millis(1)));
    let data: Arc<Dataset> = Arc::new(separable_dataset(30));
    let config = LearningCurveConfig {
        timeout_ms: Some(60_000),
        ..LearningCurveConfig::default()
    };
    let lc = calculate_learning_curve(Some(&model), Some(&data), &config, &mut seeded(7));
    assert!(lc.is_real());
    // constant negative predictions on a balanced set
    assert!(lc.value.val_scores.iter().all(|s| (*s - 0.5).abs() < 1e-9));
}

#[test]
fn too_few_records_for_folds_falls_back() {
    let model: Arc<dyn Classifier> = Arc::new(SlowRefit(Duration::from_millis(0)));
    let data: Arc<Dataset> = Arc::new(separable_dataset(2));
    let lc = calculate_learning_curve(
        Some(&model),
        Some(&data),
        &LearningCurveConfig::default(),
        &mut seeded(8),
    );
    assert_eq!(lc.source, Provenance::Synthetic);
}

// ---------------------------------------------------------------------------
// Synthetic output invariants
// ---------------------------------------------------------------------------

#[test]
fn synthetic_confusion_cells_stay_in_range() {
    let mut rng = seeded(9);
    for _ in 0..50 {
        let cm = calculate_confusion_matrix(None, None, &mut rng).value;
        assert!(cm.is_square());
        for (i, row) in cm.rows().iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let (low, high) = CONFUSION_RANGES[i][j];
                assert!(v >= low && v <= high);
            }
        }
    }
}

#[test]
fn synthetic_learning_curve_is_aligned_and_ascending() {
    let mut rng = seeded(10);
    for _ in 0..20 {
        let lc = calculate_learning_curve(None, None, &LearningCurveConfig::default(), &mut rng).value;
        assert!(lc.is_aligned());
        assert!(lc.sizes_strictly_ascending());
    }
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

#[test]
fn monthly_trend_does_not_conserve_totals() {
    let counts = RiskTierCounts {
        low: 100,
        medium: 50,
        high: 0,
    };

    // factor 0.8 + 0.4 * 0.99 = 1.196: trunc(100 / 12 * 1.196) = 9
    let high_draws = synthesize_monthly_trend(&counts, &mut ScriptedSource::constant(0.99));
    assert_eq!(high_draws.low.iter().sum::<u64>(), 108);

    // factor 0.8: trunc(100 / 12 * 0.8) = 6
    let low_draws = synthesize_monthly_trend(&counts, &mut ScriptedSource::constant(0.0));
    assert_eq!(low_draws.low.iter().sum::<u64>(), 72);
    assert!(low_draws.high.iter().all(|&v| v == 0));
}

#[test]
fn monthly_cells_stay_within_jitter_bounds() {
    let counts = RiskTierCounts {
        low: 600,
        medium: 240,
        high: 120,
    };
    let trend = synthesize_monthly_trend(&counts, &mut seeded(11));
    assert_eq!(trend.labels.len(), 12);
    for (values, total) in [(&trend.low, 600.0_f64), (&trend.medium, 240.0_f64), (&trend.high, 120.0_f64)] {
        assert_eq!(values.len(), 12);
        for &v in values.iter() {
            let v = v as f64;
            assert!(v >= (total / 12.0 * 0.8).trunc() && v <= (total / 12.0 * 1.2).trunc());
        }
    }
}
