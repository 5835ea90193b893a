// Signal Engine
// Scores option chains, emits ranked signals, and feeds realized
// outcomes back into the weight optimizer.

use crate::scoring::{aggregate_confidence, score_quote};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use common::{
    ExitReason, MarketHours, OptionQuote, ParameterScores, Signal, TradeAction, WeightVector,
};
use learning::{
    accuracy, insights, learning_progress, AccuracyReport, LearningError, LearningInsights,
    LearningRecord, LearningStore, OutcomeRecorder,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Minutes a signal stays "current" for dashboards.
const CURRENT_WINDOW_MINUTES: i64 = 30;
/// Cap applied by the filtered history query.
const FILTER_RESULT_CAP: usize = 50;
/// History entries considered for the rolling average confidence.
const AVERAGE_WINDOW: usize = 50;

/// Engine tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum aggregated confidence (0.0 to 1.0) before a signal is emitted
    pub confidence_threshold: f64,
    /// In-memory signal history cap; oldest entries are evicted first
    pub max_history: usize,
    /// Session gate: no signals outside these hours
    pub market_hours: MarketHours,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            max_history: 1000,
            market_hours: MarketHours::default(),
        }
    }
}

/// Scores chains into ranked signals and learns from their outcomes
///
/// The engine owns the current weight vector. Outcomes recorded through
/// [`SignalEngine::record_outcome`] flow into the learning crate, and
/// reoptimized weights are swapped in as soon as they are produced.
pub struct SignalEngine {
    config: EngineConfig,
    weights: WeightVector,
    history: VecDeque<Signal>,
    recorder: OutcomeRecorder,
    store: Option<Box<dyn LearningStore>>,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            weights: WeightVector::default(),
            history: VecDeque::new(),
            recorder: OutcomeRecorder::new(),
            store: None,
        }
    }

    /// Attaches a persistence backend for weights and outcome records.
    pub fn with_store(mut self, store: Box<dyn LearningStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Reloads learned state from the attached store. Load failures are
    /// logged and leave the engine on its defaults.
    pub async fn restore(&mut self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        match store.load_weights().await {
            Ok(Some(mut weights)) => {
                weights.normalize();
                self.weights = weights;
                info!("restored learned weights");
            }
            Ok(None) => debug!("no saved weights, using the default prior"),
            Err(e) => warn!(error = %e, "failed to load weights, using the default prior"),
        }
        match store.load_records().await {
            Ok(records) if !records.is_empty() => {
                if let Some(weights) = self.recorder.restore(records, &self.weights) {
                    self.weights = weights;
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to load learning records"),
        }
        Ok(())
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn recorder(&self) -> &OutcomeRecorder {
        &self.recorder
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Scores every row of a chain and returns the emitted signals,
    /// highest confidence first. Outside market hours nothing is
    /// emitted; malformed rows are skipped with a log line.
    pub fn generate_signals(
        &mut self,
        symbol: &str,
        chain: &[OptionQuote],
        underlying_price: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<Signal> {
        if !self.config.market_hours.is_open_at(now) {
            debug!(symbol, "market closed, no signals generated");
            return Vec::new();
        }

        let mut signals = Vec::new();
        for quote in chain {
            let scores = match score_quote(quote, underlying_price) {
                Ok(scores) => scores,
                Err(e) => {
                    debug!(symbol, strike = %quote.strike, error = %e, "skipping malformed chain row");
                    continue;
                }
            };
            let confidence = aggregate_confidence(&scores, &self.weights);
            if confidence < self.config.confidence_threshold {
                continue;
            }
            let action = decide_action(&scores, confidence);
            if action == TradeAction::Hold {
                continue;
            }
            signals.push(Signal {
                id: Uuid::new_v4(),
                symbol: symbol.to_string(),
                strike: quote.strike,
                option_type: quote.option_type,
                action,
                confidence: confidence * 100.0,
                reasoning: build_reasoning(&scores),
                parameters: scores,
                entry_price: quote.last_price,
                underlying_price,
                volume: quote.volume,
                open_interest: quote.open_interest,
                bid: quote.bid,
                ask: quote.ask,
                implied_volatility: quote.implied_volatility,
                created_at: now,
            });
        }

        for signal in &signals {
            self.history.push_back(signal.clone());
            while self.history.len() > self.config.max_history {
                self.history.pop_front();
            }
        }

        // Stable sort keeps chain order among equal-confidence signals.
        signals.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        info!(symbol, emitted = signals.len(), scanned = chain.len(), "chain scored");
        signals
    }

    /// Feeds a realized outcome back into learning. Unknown or already
    /// evicted signal ids are ignored with a warning.
    pub async fn record_outcome(
        &mut self,
        signal_id: Uuid,
        exit_reason: ExitReason,
        pnl: Decimal,
    ) -> Result<()> {
        let Some(signal) = self.history.iter().rev().find(|s| s.id == signal_id) else {
            warn!(%signal_id, "outcome for unknown signal, ignoring");
            return Ok(());
        };
        let record = LearningRecord {
            signal_id,
            symbol: signal.symbol.clone(),
            action: signal.action,
            parameters: signal.parameters,
            predicted_confidence: signal.confidence / 100.0,
            realized_pnl: pnl,
            was_profitable: pnl > Decimal::ZERO,
            exit_reason,
            recorded_at: Utc::now(),
        };
        debug!(%signal_id, pnl = %pnl, "outcome recorded");

        let update = self.recorder.record(record, &self.weights);
        let weights_changed = update.new_weights.is_some();
        if let Some(weights) = update.new_weights {
            info!(
                delta = weights.delta,
                oi_change = weights.oi_change,
                volume = weights.volume,
                momentum = weights.momentum,
                iv = weights.iv,
                spread = weights.spread,
                liquidity = weights.liquidity,
                "weights updated from outcomes"
            );
            self.weights = weights;
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save_records(self.recorder.log().records()).await {
                warn!(error = %e, "failed to persist learning records");
            }
            if weights_changed {
                if let Err(e) = store.save_weights(&self.weights).await {
                    warn!(error = %e, "failed to persist weights");
                }
            }
        }
        Ok(())
    }

    /// Signals from the last 30 minutes, newest first.
    pub fn current_signals(&self, now: DateTime<Utc>, limit: usize) -> Vec<Signal> {
        let cutoff = now - Duration::minutes(CURRENT_WINDOW_MINUTES);
        let mut current: Vec<Signal> = self
            .history
            .iter()
            .filter(|s| s.created_at >= cutoff)
            .cloned()
            .collect();
        current.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        current.truncate(limit);
        current
    }

    /// Signals for one symbol over a lookback window, oldest first.
    pub fn recent_signals(&self, symbol: &str, hours: i64, now: DateTime<Utc>) -> Vec<Signal> {
        let cutoff = now - Duration::hours(hours);
        self.history
            .iter()
            .filter(|s| s.symbol == symbol && s.created_at >= cutoff)
            .cloned()
            .collect()
    }

    /// Filtered history query, newest first, capped at 50 results.
    /// `min_confidence` is on the stored 0-100 scale.
    pub fn signals_with_filters(
        &self,
        symbol: Option<&str>,
        action: Option<TradeAction>,
        min_confidence: f64,
    ) -> Vec<Signal> {
        let mut matches: Vec<Signal> = self
            .history
            .iter()
            .filter(|s| symbol.map_or(true, |sym| s.symbol == sym))
            .filter(|s| action.map_or(true, |a| s.action == a))
            .filter(|s| s.confidence >= min_confidence)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(FILTER_RESULT_CAP);
        matches
    }

    /// Mean confidence (0-100) over the last 50 signals.
    pub fn average_confidence(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<f64> = self
            .history
            .iter()
            .rev()
            .take(AVERAGE_WINDOW)
            .map(|s| s.confidence)
            .collect();
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }

    pub fn accuracy(&self) -> Result<AccuracyReport, LearningError> {
        accuracy(self.recorder.log().records())
    }

    pub fn insights(&self) -> Result<LearningInsights, LearningError> {
        insights(self.recorder.log().records())
    }

    pub fn learning_progress(&self) -> Vec<f64> {
        learning_progress(self.recorder.log().records())
    }
}

/// BUY needs broad agreement; SELL needs a clear negative with decent
/// overall confidence; everything else holds.
fn decide_action(scores: &ParameterScores, confidence: f64) -> TradeAction {
    let strong_buy = scores.delta > 0.7
        && scores.oi_change > 0.6
        && scores.volume > 0.5
        && scores.momentum > 0.6;
    let moderate_buy = scores.delta > 0.5
        && scores.oi_change > 0.4
        && (scores.volume > 0.4 || scores.momentum > 0.5);

    if strong_buy || (moderate_buy && confidence > 0.7) {
        TradeAction::Buy
    } else if (scores.delta < 0.3 || scores.momentum < 0.3 || scores.iv < 0.2) && confidence > 0.5 {
        TradeAction::Sell
    } else {
        TradeAction::Hold
    }
}

/// One phrase per notably strong (>0.7) or weak (<0.3) parameter,
/// joined with semicolons. Liquidity never makes the summary.
fn build_reasoning(scores: &ParameterScores) -> String {
    let mut phrases: Vec<&str> = Vec::new();

    if scores.delta > 0.7 {
        phrases.push("Strong Delta indicating good directional bias");
    } else if scores.delta < 0.3 {
        phrases.push("Weak Delta suggesting limited directional exposure");
    }
    if scores.oi_change > 0.7 {
        phrases.push("Significant OI buildup indicating institutional interest");
    } else if scores.oi_change < 0.3 {
        phrases.push("Limited OI activity");
    }
    if scores.volume > 0.7 {
        phrases.push("High volume confirming market participation");
    } else if scores.volume < 0.3 {
        phrases.push("Low volume suggesting limited interest");
    }
    if scores.momentum > 0.7 {
        phrases.push("Favorable price momentum");
    } else if scores.momentum < 0.3 {
        phrases.push("Unfavorable price momentum");
    }
    if scores.iv > 0.7 {
        phrases.push("Optimal IV levels for entry");
    } else if scores.iv < 0.3 {
        phrases.push("Suboptimal IV levels");
    }
    if scores.spread > 0.7 {
        phrases.push("Tight bid-ask spread ensuring good execution");
    } else if scores.spread < 0.3 {
        phrases.push("Wide spread may impact execution");
    }

    if phrases.is_empty() {
        "Mixed signals across parameters".to_string()
    } else {
        phrases.join("; ")
    }
}
