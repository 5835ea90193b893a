// Weight Optimization
// Maps realized P&L of high-scoring parameters onto new aggregation weights

use crate::recorder::LearningRecord;
use crate::LearningError;
use common::{Parameter, WeightVector};
use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::Statistics;
use tracing::debug;

/// Recomputes parameter weights from recent outcomes
///
/// For each parameter, the optimizer looks at trades where that
/// parameter scored high and asks whether those trades made money. The
/// average P&L is mapped into a bounded weight; parameters with no
/// high-scoring samples in the window keep their current weight. The
/// result is always renormalized to sum to 1.0.
#[derive(Debug, Clone)]
pub struct WeightOptimizer {
    /// Minimum records in the log before optimization runs
    pub min_records: usize,
    /// Most recent records considered
    pub window: usize,
    /// Score above which a sample counts as high-conviction
    pub high_score_cutoff: f64,
    /// Rupee P&L divisor mapping average profit into weight space
    pub pnl_scale: f64,
    /// Additive base before clamping
    pub base_weight: f64,
    /// Per-parameter bounds applied before renormalization
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Default for WeightOptimizer {
    fn default() -> Self {
        Self {
            min_records: 50,
            window: 100,
            high_score_cutoff: 0.6,
            pnl_scale: 1000.0,
            base_weight: 0.15,
            min_weight: 0.05,
            max_weight: 0.35,
        }
    }
}

impl WeightOptimizer {
    pub fn optimize(
        &self,
        records: &[LearningRecord],
        current: &WeightVector,
    ) -> Result<WeightVector, LearningError> {
        if records.len() < self.min_records {
            return Err(LearningError::InsufficientData {
                required: self.min_records,
                available: records.len(),
            });
        }
        let window = &records[records.len().saturating_sub(self.window)..];

        let mut next = *current;
        for parameter in Parameter::ALL {
            let high_scoring: Vec<f64> = window
                .iter()
                .filter(|r| r.parameters.get(parameter) > self.high_score_cutoff)
                .map(|r| r.realized_pnl.to_f64().unwrap_or(0.0))
                .collect();
            if high_scoring.is_empty() {
                debug!(parameter = %parameter, "no high-scoring samples, weight retained");
                continue;
            }
            let avg_pnl = high_scoring.iter().mean();
            let weight = (avg_pnl / self.pnl_scale + self.base_weight)
                .clamp(self.min_weight, self.max_weight);
            next.set(parameter, weight);
        }
        next.normalize();
        Ok(next)
    }
}
