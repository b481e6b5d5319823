//! Population risk stratification.
//!
//! Records are bucketed into Low / Medium / High from the scoring model's
//! positive-class probability. Without a usable probability output the
//! ground-truth labels decide instead: positives are High, everything else
//! Low.
use serde::Serialize;

use crate::config::RiskThresholds;
use crate::data_handling::Dataset;
use crate::error::ComputeError;
use crate::evaluation::synthetic::month_labels;
use crate::models::{Capability, Classifier};
use crate::random::{uniform, RandomSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskTierCounts {
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "High")]
    pub high: usize,
}

impl RiskTierCounts {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    pub fn add(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
        }
    }

    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Low => self.low,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        }
    }
}

/// Which path produced a [`RiskTierCounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratification {
    Probability,
    Label,
}

/// Per-month tier counts, one entry per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub labels: Vec<String>,
    pub low: Vec<u64>,
    pub medium: Vec<u64>,
    pub high: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationStats {
    #[serde(rename = "total_patients")]
    pub total: usize,
    /// Ground-truth positives, independent of the stratification path.
    #[serde(rename = "patients_at_risk")]
    pub at_risk: usize,
    pub risk_distribution: RiskTierCounts,
    #[serde(rename = "patient_insights")]
    pub monthly_trend: MonthlyTrend,
    pub stratification: Stratification,
}

impl RiskThresholds {
    /// `p < medium` is Low, `p >= high` is High, Medium in between.
    pub fn tier(&self, probability: f64) -> RiskTier {
        if probability < self.medium {
            RiskTier::Low
        } else if probability < self.high {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

pub fn stratify_by_probability(
    model: &dyn Classifier,
    data: &Dataset,
    thresholds: &RiskThresholds,
) -> Result<RiskTierCounts, ComputeError> {
    if !model.capabilities().predict_proba {
        return Err(ComputeError::Unsupported(Capability::PredictProba));
    }
    let probs = model.predict_proba(data.x().view())?;
    if probs.len() != data.n_records() {
        return Err(ComputeError::LengthMismatch {
            expected: data.n_records(),
            actual: probs.len(),
        });
    }
    if let Some(bad) = probs.iter().find(|p| !p.is_finite()) {
        return Err(ComputeError::Model(format!("non-finite probability {}", bad)));
    }

    let mut counts = RiskTierCounts::default();
    for &p in probs.iter() {
        counts.add(thresholds.tier(p));
    }
    Ok(counts)
}

pub fn stratify_by_label(data: &Dataset, positive_label: i64) -> RiskTierCounts {
    let high = data.positive_count(positive_label);
    RiskTierCounts {
        low: data.n_records() - high,
        medium: 0,
        high,
    }
}

/// Probability-based stratification when `model` is present and works,
/// label-based otherwise.
pub fn stratify(
    model: Option<&dyn Classifier>,
    data: &Dataset,
    thresholds: &RiskThresholds,
    positive_label: i64,
) -> (RiskTierCounts, Stratification) {
    let Some(model) = model else {
        log::info!("No risk model loaded, stratifying by label");
        return (stratify_by_label(data, positive_label), Stratification::Label);
    };
    match stratify_by_probability(model, data, thresholds) {
        Ok(counts) => (counts, Stratification::Probability),
        Err(err) => {
            log::warn!("Error stratifying risk with {}: {}", model.name(), err);
            (stratify_by_label(data, positive_label), Stratification::Label)
        }
    }
}

fn monthly_share(total: usize, rng: &mut dyn RandomSource) -> u64 {
    (total as f64 / 12.0 * uniform(rng, 0.8, 1.2)).trunc() as u64
}

/// Spread tier totals over twelve months: each cell is
/// `trunc(total / 12 * U[0.8, 1.2))`, drawn month by month in Low, Medium,
/// High order. Cells are jittered independently, so a tier's twelve values
/// generally do not add back up to its total.
pub fn synthesize_monthly_trend(counts: &RiskTierCounts, rng: &mut dyn RandomSource) -> MonthlyTrend {
    let labels = month_labels();
    let mut trend = MonthlyTrend {
        low: Vec::with_capacity(labels.len()),
        medium: Vec::with_capacity(labels.len()),
        high: Vec::with_capacity(labels.len()),
        labels,
    };

    for _ in 0..trend.labels.len() {
        trend.low.push(monthly_share(counts.low, rng));
        trend.medium.push(monthly_share(counts.medium, rng));
        trend.high.push(monthly_share(counts.high, rng));
    }
    trend
}

pub fn population_stats(
    model: Option<&dyn Classifier>,
    data: &Dataset,
    thresholds: &RiskThresholds,
    positive_label: i64,
    rng: &mut dyn RandomSource,
) -> PopulationStats {
    let (risk_distribution, stratification) = stratify(model, data, thresholds, positive_label);
    log::debug!("Risk distribution ({:?}): {:?}", stratification, risk_distribution);
    let monthly_trend = synthesize_monthly_trend(&risk_distribution, rng);
    PopulationStats {
        total: data.n_records(),
        at_risk: data.positive_count(positive_label),
        risk_distribution,
        monthly_trend,
        stratification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    #[test]
    fn tier_boundaries() {
        let t = RiskThresholds::default();
        assert_eq!(t.tier(0.0), RiskTier::Low);
        assert_eq!(t.tier(0.299), RiskTier::Low);
        assert_eq!(t.tier(0.3), RiskTier::Medium);
        assert_eq!(t.tier(0.699), RiskTier::Medium);
        assert_eq!(t.tier(0.7), RiskTier::High);
        assert_eq!(t.tier(1.0), RiskTier::High);
    }

    #[test]
    fn trend_truncates_scaled_share() {
        let counts = RiskTierCounts {
            low: 120,
            medium: 0,
            high: 60,
        };
        // draw 0.5 -> factor 1.0
        let trend = synthesize_monthly_trend(&counts, &mut ScriptedSource::constant(0.5));
        assert_eq!(trend.labels.len(), 12);
        assert!(trend.low.iter().all(|&v| v == 10));
        assert!(trend.medium.iter().all(|&v| v == 0));
        assert!(trend.high.iter().all(|&v| v == 5));
    }

    #[test]
    fn tier_counts_serialize_capitalized() {
        let counts = RiskTierCounts {
            low: 1,
            medium: 2,
            high: 3,
        };
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"Low":1,"Medium":2,"High":3}"#
        );
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.get(RiskTier::Medium), 2);
    }
}
