// Learning Statistics
// Accuracy and insight summaries computed over the outcome log

use crate::recorder::LearningRecord;
use crate::LearningError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Records examined for accuracy, newest first.
const ACCURACY_WINDOW: usize = 100;
/// Minimum records before accuracy is reported.
const MIN_FOR_ACCURACY: usize = 10;
/// Minimum records before insights are reported.
const MIN_FOR_INSIGHTS: usize = 20;
/// Confidence above which a prediction counts as a profit call.
const PROFIT_CALL_CUTOFF: f64 = 0.70;
/// Confidence above which a prediction joins the high-conviction subset.
const HIGH_CONFIDENCE_CUTOFF: f64 = 0.75;
/// Trades in the recent-trend window.
const TREND_WINDOW: usize = 20;

/// A profit call (>70% confidence) on a profitable exit, or a lower
/// call on a loss.
fn prediction_correct(record: &LearningRecord) -> bool {
    (record.predicted_confidence > PROFIT_CALL_CUTOFF) == record.was_profitable
}

/// How well predicted confidence lined up with realized outcomes
#[derive(Debug, Clone, Serialize)]
pub struct AccuracyReport {
    pub evaluated: usize,
    pub correct: usize,
    /// Fraction of records where a >70% confidence call matched
    /// profitability, and a lower call matched a loss
    pub hit_rate: f64,
    pub high_confidence_evaluated: usize,
    pub high_confidence_correct: usize,
    /// Win rate among >75% confidence calls; None when there were none
    pub high_confidence_hit_rate: Option<f64>,
}

/// Direction of recent results against the full history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceTrend {
    Improving,
    Stable,
    Declining,
}

/// Aggregate trade performance derived from the outcome log
#[derive(Debug, Clone, Serialize)]
pub struct LearningInsights {
    pub total_trades: usize,
    /// Fraction of profitable trades, 0.0 to 1.0
    pub win_rate: f64,
    pub average_pnl: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    /// Symbol with the highest cumulative P&L
    pub best_symbol: Option<String>,
    /// Win rate over the last twenty trades
    pub recent_win_rate: f64,
    pub trend: PerformanceTrend,
}

/// Prediction accuracy over the most recent records.
pub fn accuracy(records: &[LearningRecord]) -> Result<AccuracyReport, LearningError> {
    if records.len() < MIN_FOR_ACCURACY {
        return Err(LearningError::InsufficientData {
            required: MIN_FOR_ACCURACY,
            available: records.len(),
        });
    }
    let recent = &records[records.len().saturating_sub(ACCURACY_WINDOW)..];
    let correct = recent.iter().filter(|r| prediction_correct(r)).count();

    let high: Vec<&LearningRecord> = recent
        .iter()
        .filter(|r| r.predicted_confidence > HIGH_CONFIDENCE_CUTOFF)
        .collect();
    let high_correct = high.iter().filter(|r| r.was_profitable).count();
    let high_rate = if high.is_empty() {
        None
    } else {
        Some(high_correct as f64 / high.len() as f64)
    };

    Ok(AccuracyReport {
        evaluated: recent.len(),
        correct,
        hit_rate: correct as f64 / recent.len() as f64,
        high_confidence_evaluated: high.len(),
        high_confidence_correct: high_correct,
        high_confidence_hit_rate: high_rate,
    })
}

/// Performance summary across the whole log.
pub fn insights(records: &[LearningRecord]) -> Result<LearningInsights, LearningError> {
    if records.len() < MIN_FOR_INSIGHTS {
        return Err(LearningError::InsufficientData {
            required: MIN_FOR_INSIGHTS,
            available: records.len(),
        });
    }
    let total = records.len();
    let wins = records.iter().filter(|r| r.was_profitable).count();
    let win_rate = wins as f64 / total as f64;

    let sum: Decimal = records.iter().map(|r| r.realized_pnl).sum();
    let average_pnl = sum / Decimal::from(total as u64);
    let best_trade = records
        .iter()
        .map(|r| r.realized_pnl)
        .max()
        .unwrap_or_default();
    let worst_trade = records
        .iter()
        .map(|r| r.realized_pnl)
        .min()
        .unwrap_or_default();

    let mut by_symbol: HashMap<&str, Decimal> = HashMap::new();
    for record in records {
        *by_symbol.entry(record.symbol.as_str()).or_default() += record.realized_pnl;
    }
    let best_symbol = by_symbol
        .into_iter()
        .max_by_key(|(_, pnl)| *pnl)
        .map(|(symbol, _)| symbol.to_string());

    let recent = &records[records.len().saturating_sub(TREND_WINDOW)..];
    let recent_wins = recent.iter().filter(|r| r.was_profitable).count();
    let recent_win_rate = recent_wins as f64 / recent.len() as f64;

    let trend = if recent_win_rate > win_rate + 0.10 {
        PerformanceTrend::Improving
    } else if recent_win_rate < win_rate - 0.10 {
        PerformanceTrend::Declining
    } else {
        PerformanceTrend::Stable
    };

    Ok(LearningInsights {
        total_trades: total,
        win_rate,
        average_pnl,
        best_trade,
        worst_trade,
        best_symbol,
        recent_win_rate,
        trend,
    })
}

/// Rolling prediction-accuracy curve in percent: a 20-record window
/// advanced five records at a time, each window scored with the same
/// profit-call agreement as [`accuracy`]. Empty until the log reaches
/// the first window.
pub fn learning_progress(records: &[LearningRecord]) -> Vec<f64> {
    const WINDOW: usize = 20;
    const STRIDE: usize = 5;
    if records.len() < WINDOW {
        return Vec::new();
    }
    (WINDOW..=records.len())
        .step_by(STRIDE)
        .map(|end| {
            let window = &records[end - WINDOW..end];
            let correct = window.iter().filter(|r| prediction_correct(r)).count();
            correct as f64 / WINDOW as f64 * 100.0
        })
        .collect()
}
