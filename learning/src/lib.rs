//! Outcome learning for the signal engine.
//!
//! Every closed trade comes back here as a [`LearningRecord`]. The
//! recorder keeps a bounded log of them and, on a fixed cadence,
//! refits the profitability model and reoptimizes the parameter
//! weights that the signal engine aggregates with. Accuracy and
//! insight summaries are derived from the same log.

pub mod model;
pub mod optimizer;
pub mod recorder;
pub mod stats;
pub mod storage;

pub use model::{ModelConfig, ProfitModel, TrainingReport};
pub use optimizer::WeightOptimizer;
pub use recorder::{LearningLog, LearningRecord, LearningUpdate, OutcomeRecorder, MAX_RECORDS};
pub use stats::{
    accuracy, insights, learning_progress, AccuracyReport, LearningInsights, PerformanceTrend,
};
pub use storage::{InMemoryLearningStore, JsonLearningStore, LearningStore};

use std::fmt;

/// Training and optimization failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningError {
    InsufficientData { required: usize, available: usize },
}

impl fmt::Display for LearningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningError::InsufficientData { required, available } => {
                write!(
                    f,
                    "insufficient data: {} records required, {} available",
                    required, available
                )
            }
        }
    }
}

impl std::error::Error for LearningError {}
