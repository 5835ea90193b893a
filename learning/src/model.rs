// Profitability Model
// Gradient-boosted regression stumps over parameter scores. The model
// predicts expected P&L and is advisory only; signal emission never
// depends on it.

use crate::recorder::LearningRecord;
use crate::LearningError;
use chrono::{DateTime, Utc};
use common::{Parameter, ParameterScores};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scores land on bucket values (0.1 to 0.9), so split candidates sit
/// between the buckets.
const SPLIT_CANDIDATES: [f64; 8] = [0.15, 0.25, 0.35, 0.45, 0.55, 0.65, 0.75, 0.85];

/// Training configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Boosting rounds
    pub rounds: usize,
    pub learning_rate: f64,
    /// Minimum records before training runs at all
    pub min_samples: usize,
    /// Record count at which a holdout split is carved off
    pub holdout_from: usize,
    /// Fraction of records held out, newest records last
    pub holdout_fraction: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rounds: 200,
            learning_rate: 0.1,
            min_samples: 20,
            holdout_from: 30,
            holdout_fraction: 0.2,
        }
    }
}

/// One regression stump: route on a single parameter threshold
#[derive(Debug, Clone, Copy)]
struct Stump {
    feature: Parameter,
    threshold: f64,
    /// Contribution when the score is at or below the threshold
    below: f64,
    /// Contribution when the score is above the threshold
    above: f64,
}

impl Stump {
    fn value(&self, scores: &ParameterScores) -> f64 {
        if scores.get(self.feature) > self.threshold {
            self.above
        } else {
            self.below
        }
    }
}

/// Result of one training pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub train_r2: f64,
    /// Present once enough records exist for a holdout split
    pub holdout_r2: Option<f64>,
}

/// Boosted-stump regressor from parameter scores to realized P&L
#[derive(Debug, Clone, Default)]
pub struct ProfitModel {
    config: ModelConfig,
    base: f64,
    stumps: Vec<Stump>,
    trained: bool,
    history: Vec<TrainingReport>,
}

impl ProfitModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Reports from every completed training pass, oldest first.
    pub fn history(&self) -> &[TrainingReport] {
        &self.history
    }

    /// Expected P&L for a scored contract. None until the first fit.
    pub fn predict(&self, scores: &ParameterScores) -> Option<f64> {
        if !self.trained {
            return None;
        }
        let sum: f64 = self.stumps.iter().map(|s| s.value(scores)).sum();
        Some(self.base + sum)
    }

    pub fn fit(&mut self, records: &[LearningRecord]) -> Result<TrainingReport, LearningError> {
        if records.len() < self.config.min_samples {
            return Err(LearningError::InsufficientData {
                required: self.config.min_samples,
                available: records.len(),
            });
        }
        let features: Vec<ParameterScores> = records.iter().map(|r| r.parameters).collect();
        let targets: Vec<f64> = records
            .iter()
            .map(|r| r.realized_pnl.to_f64().unwrap_or(0.0))
            .collect();

        // The newest records form the holdout so evaluation reflects
        // how the model generalizes forward in time.
        let holdout_len = if records.len() >= self.config.holdout_from {
            ((records.len() as f64 * self.config.holdout_fraction) as usize).max(1)
        } else {
            0
        };
        let train_len = records.len() - holdout_len;

        self.boost(&features[..train_len], &targets[..train_len]);
        self.trained = true;

        let train_r2 = self.r_squared(&features[..train_len], &targets[..train_len]);
        let holdout_r2 = if holdout_len > 0 {
            Some(self.r_squared(&features[train_len..], &targets[train_len..]))
        } else {
            None
        };
        debug!(samples = records.len(), train_r2, ?holdout_r2, "model fit complete");

        let report = TrainingReport {
            trained_at: Utc::now(),
            samples: records.len(),
            train_r2,
            holdout_r2,
        };
        self.history.push(report.clone());
        Ok(report)
    }

    fn boost(&mut self, features: &[ParameterScores], targets: &[f64]) {
        let n = targets.len() as f64;
        self.base = targets.iter().sum::<f64>() / n;
        self.stumps.clear();

        let mut residuals: Vec<f64> = targets.iter().map(|t| t - self.base).collect();
        for _ in 0..self.config.rounds {
            let Some((stump, fitted)) = best_stump(features, &residuals) else {
                break;
            };
            let stump = Stump {
                below: stump.below * self.config.learning_rate,
                above: stump.above * self.config.learning_rate,
                ..stump
            };
            for (residual, value) in residuals.iter_mut().zip(&fitted) {
                *residual -= value * self.config.learning_rate;
            }
            self.stumps.push(stump);
        }
    }

    fn r_squared(&self, features: &[ParameterScores], targets: &[f64]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let mean = targets.iter().sum::<f64>() / targets.len() as f64;
        let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
        if ss_tot <= f64::EPSILON {
            return 0.0;
        }
        let ss_res: f64 = features
            .iter()
            .zip(targets)
            .map(|(scores, target)| {
                let predicted = self.predict(scores).unwrap_or(self.base);
                (target - predicted).powi(2)
            })
            .sum();
        1.0 - ss_res / ss_tot
    }
}

/// Exhaustive search over features and split points for the stump that
/// removes the most residual variance. Returns the stump and its
/// fitted value per sample, or None when no split helps.
fn best_stump(features: &[ParameterScores], residuals: &[f64]) -> Option<(Stump, Vec<f64>)> {
    let mut best: Option<(Stump, f64)> = None;
    for feature in Parameter::ALL {
        for threshold in SPLIT_CANDIDATES {
            let mut sum_below = 0.0;
            let mut n_below = 0usize;
            let mut sum_above = 0.0;
            let mut n_above = 0usize;
            for (scores, residual) in features.iter().zip(residuals) {
                if scores.get(feature) > threshold {
                    sum_above += residual;
                    n_above += 1;
                } else {
                    sum_below += residual;
                    n_below += 1;
                }
            }
            let mean_below = if n_below > 0 { sum_below / n_below as f64 } else { 0.0 };
            let mean_above = if n_above > 0 { sum_above / n_above as f64 } else { 0.0 };
            let reduction =
                n_below as f64 * mean_below.powi(2) + n_above as f64 * mean_above.powi(2);
            let is_better = best.as_ref().map(|(_, r)| reduction > *r).unwrap_or(true);
            if is_better {
                best = Some((
                    Stump {
                        feature,
                        threshold,
                        below: mean_below,
                        above: mean_above,
                    },
                    reduction,
                ));
            }
        }
    }
    let (stump, reduction) = best?;
    if reduction <= 1e-12 {
        return None;
    }
    let fitted = features
        .iter()
        .map(|scores| {
            if scores.get(stump.feature) > stump.threshold {
                stump.above
            } else {
                stump.below
            }
        })
        .collect();
    Some((stump, fitted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ExitReason, TradeAction};
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;
    use uuid::Uuid;

    // P&L is a clean function of the delta score, so a stump model on
    // delta can represent it exactly.
    fn record_for_delta(delta_score: f64) -> LearningRecord {
        let pnl = 1000.0 * delta_score - 200.0;
        LearningRecord {
            signal_id: Uuid::new_v4(),
            symbol: "NIFTY".to_string(),
            action: TradeAction::Buy,
            parameters: ParameterScores {
                delta: delta_score,
                oi_change: 0.5,
                volume: 0.5,
                momentum: 0.4,
                iv: 0.7,
                spread: 0.9,
                liquidity: 0.8,
            },
            predicted_confidence: 0.7,
            realized_pnl: Decimal::from_f64(pnl).unwrap(),
            was_profitable: pnl > 0.0,
            exit_reason: ExitReason::Manual,
            recorded_at: Utc::now(),
        }
    }

    fn bucket_cycle(n: usize) -> Vec<LearningRecord> {
        let buckets = [0.2, 0.5, 0.7, 0.9];
        (0..n).map(|i| record_for_delta(buckets[i % 4])).collect()
    }

    #[test]
    fn refuses_small_samples() {
        let mut model = ProfitModel::default();
        let err = model.fit(&bucket_cycle(19)).unwrap_err();
        assert_eq!(
            err,
            LearningError::InsufficientData {
                required: 20,
                available: 19
            }
        );
        assert!(!model.is_trained());
        assert!(model.predict(&ParameterScores::default()).is_none());
    }

    #[test]
    fn fits_bucketed_relationship() {
        let mut model = ProfitModel::default();
        let report = model.fit(&bucket_cycle(24)).unwrap();
        assert!(model.is_trained());
        assert_eq!(report.samples, 24);
        assert!(report.train_r2 > 0.95, "train_r2 = {}", report.train_r2);
        // Below the holdout threshold no split happens.
        assert!(report.holdout_r2.is_none());

        let predicted = model
            .predict(&record_for_delta(0.9).parameters)
            .unwrap();
        assert!((predicted - 700.0).abs() < 40.0, "predicted = {}", predicted);
    }

    #[test]
    fn holdout_split_kicks_in_at_thirty() {
        let mut model = ProfitModel::default();
        let report = model.fit(&bucket_cycle(40)).unwrap();
        // 20% of 40 = 8 held out; the relationship holds out of sample.
        let holdout_r2 = report.holdout_r2.unwrap();
        assert!(holdout_r2 > 0.9, "holdout_r2 = {}", holdout_r2);
        assert_eq!(model.history().len(), 1);
    }

    #[test]
    fn constant_targets_produce_flat_model() {
        let mut model = ProfitModel::default();
        let records: Vec<_> = (0..25)
            .map(|_| {
                let mut r = record_for_delta(0.7);
                r.realized_pnl = Decimal::from(300);
                r
            })
            .collect();
        let report = model.fit(&records).unwrap();
        // Zero target variance: r2 is defined as 0 and the prediction
        // collapses to the base value.
        assert_eq!(report.train_r2, 0.0);
        let predicted = model.predict(&records[0].parameters).unwrap();
        assert!((predicted - 300.0).abs() < 1e-6);
    }
}
