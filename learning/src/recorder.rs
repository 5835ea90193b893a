// Outcome Recording
// Accumulates realized trade outcomes and drives the retraining cadence

use crate::model::ProfitModel;
use crate::optimizer::WeightOptimizer;
use crate::LearningError;
use chrono::{DateTime, Utc};
use common::{ExitReason, ParameterScores, TradeAction, WeightVector};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Oldest records are evicted once the log exceeds this.
pub const MAX_RECORDS: usize = 1000;

/// Realized outcome of one signal, kept as a training sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningRecord {
    pub signal_id: Uuid,
    pub symbol: String,
    pub action: TradeAction,
    pub parameters: ParameterScores,
    /// Confidence predicted at signal time, 0.0 to 1.0
    pub predicted_confidence: f64,
    pub realized_pnl: Decimal,
    pub was_profitable: bool,
    pub exit_reason: ExitReason,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded outcome log with replace-by-signal-id semantics
///
/// A second outcome for the same signal overwrites the first, so a
/// replayed exit event cannot double-count in training data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningLog {
    records: Vec<LearningRecord>,
}

impl LearningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record. Returns true when the record is new.
    pub fn upsert(&mut self, record: LearningRecord) -> bool {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.signal_id == record.signal_id)
        {
            *existing = record;
            return false;
        }
        self.records.push(record);
        if self.records.len() > MAX_RECORDS {
            self.records.remove(0);
        }
        true
    }

    pub fn records(&self) -> &[LearningRecord] {
        &self.records
    }

    /// The most recent `n` records, oldest first.
    pub fn last_n(&self, n: usize) -> &[LearningRecord] {
        &self.records[self.records.len().saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replaces the whole log, keeping only the newest records when the
    /// input exceeds the cap.
    pub fn replace_all(&mut self, mut records: Vec<LearningRecord>) {
        if records.len() > MAX_RECORDS {
            records.drain(..records.len() - MAX_RECORDS);
        }
        self.records = records;
    }
}

/// What changed after an outcome was recorded
#[derive(Debug, Clone, Default)]
pub struct LearningUpdate {
    /// New normalized weights, when optimization ran and succeeded
    pub new_weights: Option<WeightVector>,
    pub model_retrained: bool,
}

/// Feeds outcomes into the log and retrains on a fixed cadence
///
/// Every `retrain_interval` new records the profitability model is
/// refit and the weight optimizer is rerun. Replacements of existing
/// records never advance the cadence.
#[derive(Debug, Clone)]
pub struct OutcomeRecorder {
    log: LearningLog,
    optimizer: WeightOptimizer,
    model: ProfitModel,
    retrain_interval: usize,
    new_records: usize,
}

impl Default for OutcomeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self {
            log: LearningLog::new(),
            optimizer: WeightOptimizer::default(),
            model: ProfitModel::default(),
            retrain_interval: 30,
            new_records: 0,
        }
    }

    pub fn with_optimizer(mut self, optimizer: WeightOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn log(&self) -> &LearningLog {
        &self.log
    }

    pub fn model(&self) -> &ProfitModel {
        &self.model
    }

    /// Records one outcome and, on the retraining cadence, refits the
    /// model and reoptimizes the weights.
    pub fn record(&mut self, record: LearningRecord, current_weights: &WeightVector) -> LearningUpdate {
        let signal_id = record.signal_id;
        if !self.log.upsert(record) {
            debug!(%signal_id, "outcome replaced an existing record");
            return LearningUpdate::default();
        }
        self.new_records += 1;
        if self.new_records % self.retrain_interval != 0 {
            return LearningUpdate::default();
        }
        self.retrain(current_weights)
    }

    /// Replaces the log wholesale (e.g. from persistence) and runs one
    /// training pass over it. Returns reoptimized weights when there is
    /// enough data.
    pub fn restore(
        &mut self,
        records: Vec<LearningRecord>,
        current_weights: &WeightVector,
    ) -> Option<WeightVector> {
        self.log.replace_all(records);
        self.new_records = 0;
        if self.log.is_empty() {
            return None;
        }
        info!(records = self.log.len(), "restored learning log");
        let update = self.retrain(current_weights);
        update.new_weights
    }

    fn retrain(&mut self, current_weights: &WeightVector) -> LearningUpdate {
        let model_retrained = match self.model.fit(self.log.records()) {
            Ok(report) => {
                info!(
                    samples = report.samples,
                    train_r2 = report.train_r2,
                    "profitability model retrained"
                );
                true
            }
            Err(LearningError::InsufficientData { required, available }) => {
                debug!(required, available, "model training skipped");
                false
            }
        };
        let new_weights = match self.optimizer.optimize(self.log.records(), current_weights) {
            Ok(weights) => {
                info!("parameter weights reoptimized from outcomes");
                Some(weights)
            }
            Err(LearningError::InsufficientData { required, available }) => {
                debug!(required, available, "weight optimization skipped");
                None
            }
        };
        LearningUpdate {
            new_weights,
            model_retrained,
        }
    }
}
