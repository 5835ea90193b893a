//! Risk gate for options trading signals.
//!
//! Every candidate trade passes through seven validation checks
//! covering session timing, position limits, exposure, the daily loss
//! budget, contract liquidity, spread quality and the IV band. The
//! gate also owns the open position book: lot sizing, stop and target
//! derivation, mark-to-market updates, exit alerts and the daily
//! realized P&L ledger.

pub mod checks;
pub mod config;
pub mod metrics;
pub mod positions;
pub mod sizing;
pub mod storage;

pub use checks::{RiskCheck, RiskChecker, ValidationResult};
pub use config::{create_config_template, load_config, save_config};
pub use config::{RiskConfig, RiskLimits, SessionConfig};
pub use metrics::{portfolio_summary, risk_report, PortfolioSummary, RiskReport};
pub use positions::{ExitAlert, Position, PositionBook, PositionStatus};
pub use sizing::{position_size_lots, stop_loss_price, take_profit_price};
pub use storage::{InMemoryPositionStore, JsonPositionStore, PositionStore};

use chrono::{DateTime, Utc};
use common::{ExitReason, Signal};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

/// Validation, sizing and position tracking behind one handle
pub struct RiskGate {
    book: PositionBook,
    checker: RiskChecker,
    config: RiskConfig,
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskGate {
    pub fn new() -> Self {
        Self::with_config(RiskConfig::default())
    }

    pub fn with_config(config: RiskConfig) -> Self {
        let checker = RiskChecker::new(config.limits.clone(), config.session.clone());
        Self {
            book: PositionBook::new(),
            checker,
            config,
        }
    }

    /// Runs all seven checks against the current book.
    pub fn validate_trade(&self, signal: &Signal, now: DateTime<Utc>) -> ValidationResult {
        self.checker.validate(signal, &self.book, now)
    }

    /// Lots for a contract price under the configured budget.
    pub fn position_size_lots(&self, price: Decimal, available_capital: Decimal) -> u32 {
        position_size_lots(price, available_capital, &self.config.limits)
    }

    /// Opens a position from an approved signal with derived stop and
    /// target prices. Quantity is lots times the configured lot size.
    pub fn open_position(&mut self, signal: &Signal, lots: u32, now: DateTime<Utc>) -> Uuid {
        let quantity = lots * self.config.limits.lot_size;
        let position = Position {
            id: Uuid::new_v4(),
            symbol: signal.symbol.clone(),
            strike: signal.strike,
            option_type: signal.option_type,
            quantity,
            entry_price: signal.entry_price,
            current_price: signal.entry_price,
            stop_loss: stop_loss_price(signal.entry_price, &self.config.limits),
            take_profit: take_profit_price(signal.entry_price, &self.config.limits),
            unrealized_pnl: Decimal::ZERO,
            status: PositionStatus::Open,
            opened_at: now,
            updated_at: now,
            closed_at: None,
        };
        let id = position.id;
        info!(
            %id,
            symbol = %signal.symbol,
            strike = %signal.strike,
            lots,
            quantity,
            entry = %signal.entry_price,
            stop = %position.stop_loss,
            target = %position.take_profit,
            "opening position"
        );
        self.book.open(position);
        id
    }

    /// Closes a position and realizes its P&L into the daily ledger.
    pub fn close_position(
        &mut self,
        id: Uuid,
        exit_price: Decimal,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> Option<Decimal> {
        let pnl = self.book.close(id, exit_price, now);
        match pnl {
            Some(pnl) => info!(%id, %reason, pnl = %pnl, "position closed"),
            None => warn!(%id, "close requested for unknown position"),
        }
        pnl
    }

    /// Marks a position to the latest traded price.
    pub fn update_price(&mut self, id: Uuid, price: Decimal, now: DateTime<Utc>) -> bool {
        self.book.update_price(id, price, now)
    }

    /// Stops and targets crossed by current marks.
    pub fn exit_alerts(&self) -> Vec<ExitAlert> {
        self.book.exit_alerts()
    }

    /// Adds an externally realized amount to the daily ledger.
    pub fn record_realized(&mut self, pnl: Decimal) {
        self.book.record_realized(pnl);
    }

    /// Start-of-session reset for the daily ledger.
    pub fn reset_daily(&mut self) {
        info!("daily loss ledger reset");
        self.book.reset_daily();
    }

    pub fn summary(&self) -> PortfolioSummary {
        portfolio_summary(&self.book, &self.config.limits)
    }

    pub fn risk_report(&self) -> RiskReport {
        risk_report(&self.book, &self.config.limits)
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.config.limits
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    /// Swaps in new limits; subsequent validations use them immediately.
    pub fn update_limits(&mut self, limits: RiskLimits) {
        info!("risk limits updated");
        self.checker = RiskChecker::new(limits.clone(), self.config.session.clone());
        self.config.limits = limits;
    }

    /// Saves the open book. Failures are logged, not propagated; a
    /// trading session must not die on a persistence hiccup.
    pub async fn persist(&self, store: &dyn PositionStore) {
        let snapshot = self.book.snapshot();
        if let Err(e) = store.save(&snapshot).await {
            warn!(error = %e, "failed to persist positions");
        }
    }

    /// Reloads the open book. Failures are logged and leave the book
    /// empty.
    pub async fn restore(&mut self, store: &dyn PositionStore) {
        match store.load().await {
            Ok(positions) => {
                if !positions.is_empty() {
                    info!(count = positions.len(), "restored positions");
                }
                self.book.restore(positions);
            }
            Err(e) => warn!(error = %e, "failed to load positions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{OptionType, ParameterScores, TradeAction};
    use rust_decimal_macros::dec;

    // Tuesday 2024-01-02, 10:30 IST.
    fn trading_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
    }

    fn buy_signal(entry: Decimal) -> Signal {
        Signal {
            id: Uuid::new_v4(),
            symbol: "NIFTY".to_string(),
            strike: dec!(22000),
            option_type: OptionType::Call,
            action: TradeAction::Buy,
            confidence: 82.0,
            reasoning: "Strong Delta indicating good directional bias".to_string(),
            parameters: ParameterScores::default(),
            entry_price: entry,
            underlying_price: dec!(22150),
            volume: 2000,
            open_interest: 10000,
            bid: entry - dec!(0.25),
            ask: entry + dec!(0.25),
            implied_volatility: 20.0,
            created_at: trading_now(),
        }
    }

    #[test]
    fn full_trade_lifecycle() {
        let mut gate = RiskGate::new();
        let signal = buy_signal(dec!(50));

        let validation = gate.validate_trade(&signal, trading_now());
        assert!(validation.passed, "failed: {:?}", validation.failed_checks);

        let lots = gate.position_size_lots(signal.entry_price, dec!(100000));
        assert_eq!(lots, 1);

        let id = gate.open_position(&signal, lots, trading_now());
        assert_eq!(gate.book().open_count(), 1);
        let position = gate.book().get(id).unwrap();
        assert_eq!(position.quantity, 75);
        assert_eq!(position.stop_loss, dec!(45.00));
        assert_eq!(position.take_profit, dec!(60.00));

        // Mark through the target and expect an alert.
        assert!(gate.update_price(id, dec!(61), trading_now()));
        let alerts = gate.exit_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, ExitReason::TargetHit);

        let pnl = gate
            .close_position(id, dec!(61), ExitReason::TargetHit, trading_now())
            .unwrap();
        assert_eq!(pnl, dec!(825));
        assert_eq!(gate.book().open_count(), 0);
        assert_eq!(gate.summary().daily_realized_pnl, dec!(825));
    }

    #[test]
    fn losses_through_the_gate_tighten_the_daily_budget() {
        let mut gate = RiskGate::new();
        let signal = buy_signal(dec!(50));

        let id = gate.open_position(&signal, 1, trading_now());
        // Stop out for a 375 loss (5 points x 75 units).
        gate.close_position(id, dec!(45), ExitReason::StopLoss, trading_now());
        assert_eq!(gate.summary().daily_realized_pnl, dec!(-375));

        // Push the ledger to the cap; the next trade is rejected.
        gate.record_realized(dec!(-14625));
        let result = gate.validate_trade(&signal, trading_now());
        assert!(result.failed(RiskCheck::DailyLoss));

        gate.reset_daily();
        assert!(gate.validate_trade(&signal, trading_now()).passed);
    }

    #[test]
    fn update_limits_applies_immediately() {
        let mut gate = RiskGate::new();
        let signal = buy_signal(dec!(50));
        assert!(gate.validate_trade(&signal, trading_now()).passed);

        let mut limits = RiskLimits::default();
        limits.min_volume = 5000;
        gate.update_limits(limits);

        let result = gate.validate_trade(&signal, trading_now());
        assert!(result.failed(RiskCheck::Liquidity));
        assert_eq!(gate.limits().min_volume, 5000);
    }

    #[test]
    fn summary_and_report_reflect_the_book() {
        let mut gate = RiskGate::new();
        let id = gate.open_position(&buy_signal(dec!(100)), 1, trading_now());
        gate.update_price(id, dec!(95), trading_now());

        let summary = gate.summary();
        assert_eq!(summary.open_positions, 1);
        assert_eq!(summary.total_exposure, dec!(7500));
        assert_eq!(summary.unrealized_pnl, dec!(-375));
        assert!((summary.risk_utilization - 15.0).abs() < 1e-9);

        let report = gate.risk_report();
        assert_eq!(report.worst_open_drawdown, dec!(-375));
        assert_eq!(report.open_win_rate, 0.0);
        assert!((report.risk_reward_ratio - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn positions_survive_a_restart() {
        let store = InMemoryPositionStore::new();
        let mut gate = RiskGate::new();
        let id = gate.open_position(&buy_signal(dec!(50)), 2, trading_now());
        gate.persist(&store).await;

        let mut revived = RiskGate::new();
        revived.restore(&store).await;
        assert_eq!(revived.book().open_count(), 1);
        let position = revived.book().get(id).unwrap();
        assert_eq!(position.quantity, 150);
        assert_eq!(position.entry_price, dec!(50));
    }
}
