//! The seven-check trade validation pipeline.
//!
//! Every check runs on every candidate; validation never short-circuits,
//! so a rejection lists everything that was wrong with the trade.

use crate::config::{RiskLimits, SessionConfig};
use crate::positions::PositionBook;
use chrono::{DateTime, Utc};
use common::Signal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// The named validation checks, in evaluation order
///
/// Serialized names match [`RiskCheck::as_str`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskCheck {
    #[serde(rename = "time_check")]
    Time,
    #[serde(rename = "position_limit_check")]
    PositionLimit,
    #[serde(rename = "risk_limit_check")]
    RiskLimit,
    #[serde(rename = "daily_loss_check")]
    DailyLoss,
    #[serde(rename = "liquidity_check")]
    Liquidity,
    #[serde(rename = "spread_check")]
    Spread,
    #[serde(rename = "volatility_check")]
    Volatility,
}

impl RiskCheck {
    pub const ALL: [RiskCheck; 7] = [
        RiskCheck::Time,
        RiskCheck::PositionLimit,
        RiskCheck::RiskLimit,
        RiskCheck::DailyLoss,
        RiskCheck::Liquidity,
        RiskCheck::Spread,
        RiskCheck::Volatility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCheck::Time => "time_check",
            RiskCheck::PositionLimit => "position_limit_check",
            RiskCheck::RiskLimit => "risk_limit_check",
            RiskCheck::DailyLoss => "daily_loss_check",
            RiskCheck::Liquidity => "liquidity_check",
            RiskCheck::Spread => "spread_check",
            RiskCheck::Volatility => "volatility_check",
        }
    }
}

impl fmt::Display for RiskCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of validating one signal against the book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub failed_checks: Vec<RiskCheck>,
    pub checked_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn failed(&self, check: RiskCheck) -> bool {
        self.failed_checks.contains(&check)
    }
}

/// Runs the validation pipeline against limits and session config
#[derive(Debug, Clone)]
pub struct RiskChecker {
    limits: RiskLimits,
    session: SessionConfig,
}

impl RiskChecker {
    pub fn new(limits: RiskLimits, session: SessionConfig) -> Self {
        Self { limits, session }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Validates a candidate trade. All seven checks always run.
    pub fn validate(
        &self,
        signal: &Signal,
        book: &PositionBook,
        now: DateTime<Utc>,
    ) -> ValidationResult {
        let results = [
            (RiskCheck::Time, self.check_time(now)),
            (
                RiskCheck::PositionLimit,
                self.check_position_limits(&signal.symbol, book),
            ),
            (RiskCheck::RiskLimit, self.check_risk_limits(signal, book)),
            (RiskCheck::DailyLoss, self.check_daily_loss(book)),
            (RiskCheck::Liquidity, self.check_liquidity(signal)),
            (RiskCheck::Spread, self.check_spread(signal)),
            (RiskCheck::Volatility, self.check_volatility(signal)),
        ];

        let mut failed_checks = Vec::new();
        for (check, passed) in results {
            debug!(check = check.as_str(), passed, "risk check evaluated");
            if !passed {
                failed_checks.push(check);
            }
        }
        if !failed_checks.is_empty() {
            let names: Vec<&str> = failed_checks.iter().map(|c| c.as_str()).collect();
            warn!(
                symbol = %signal.symbol,
                strike = %signal.strike,
                failed = ?names,
                "trade rejected"
            );
        }

        ValidationResult {
            passed: failed_checks.is_empty(),
            failed_checks,
            checked_at: now,
        }
    }

    /// Inside market hours on a weekday, and outside the no-trade
    /// buffers at the open and the close.
    pub fn check_time(&self, now: DateTime<Utc>) -> bool {
        if !self.session.hours.is_open_at(now) {
            return false;
        }
        let local = self.session.hours.local_time(now).time();
        local >= self.session.no_trade_before && local <= self.session.no_trade_after
    }

    fn check_position_limits(&self, symbol: &str, book: &PositionBook) -> bool {
        book.count_for_symbol(symbol) < self.limits.max_positions_per_symbol
            && book.open_count() < self.limits.max_total_positions
    }

    /// One lot of premium must fit the per-trade cap, and the portfolio
    /// exposure cap after adding it.
    fn check_risk_limits(&self, signal: &Signal, book: &PositionBook) -> bool {
        let lot_notional = (signal.entry_price * Decimal::from(self.limits.lot_size))
            .to_f64()
            .unwrap_or(f64::MAX);
        if lot_notional > self.limits.max_loss_per_trade {
            return false;
        }
        let exposure = book.total_exposure().to_f64().unwrap_or(f64::MAX);
        exposure + lot_notional <= self.limits.max_portfolio_risk
    }

    /// Strictly below the budget: hitting the cap exactly stops trading.
    fn check_daily_loss(&self, book: &PositionBook) -> bool {
        let daily = book.daily_realized_pnl().to_f64().unwrap_or(f64::MAX);
        daily.abs() < self.limits.max_daily_loss
    }

    fn check_liquidity(&self, signal: &Signal) -> bool {
        signal.volume >= self.limits.min_volume
            && signal.open_interest >= self.limits.min_open_interest
    }

    fn check_spread(&self, signal: &Signal) -> bool {
        if signal.entry_price <= Decimal::ZERO || signal.ask <= signal.bid {
            return false;
        }
        let spread = ((signal.ask - signal.bid) / signal.entry_price)
            .to_f64()
            .unwrap_or(f64::MAX);
        spread <= self.limits.max_bid_ask_spread
    }

    /// IV band boundaries are acceptable values.
    fn check_volatility(&self, signal: &Signal) -> bool {
        signal.implied_volatility >= self.limits.min_iv
            && signal.implied_volatility <= self.limits.max_iv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{OptionType, ParameterScores, TradeAction};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    // Tuesday 2024-01-02, 10:30 IST.
    fn trading_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
    }

    fn checker() -> RiskChecker {
        RiskChecker::new(RiskLimits::default(), SessionConfig::default())
    }

    fn good_signal() -> Signal {
        Signal {
            id: Uuid::new_v4(),
            symbol: "NIFTY".to_string(),
            strike: dec!(22000),
            option_type: OptionType::Call,
            action: TradeAction::Buy,
            confidence: 82.0,
            reasoning: String::new(),
            parameters: ParameterScores::default(),
            entry_price: dec!(50),
            underlying_price: dec!(22150),
            volume: 2000,
            open_interest: 10000,
            bid: dec!(49.5),
            ask: dec!(50),
            implied_volatility: 20.0,
            created_at: trading_now(),
        }
    }

    fn open_test_position(book: &mut PositionBook, symbol: &str, entry: Decimal, quantity: u32) {
        book.open(crate::positions::Position {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            strike: dec!(22000),
            option_type: OptionType::Call,
            quantity,
            entry_price: entry,
            current_price: entry,
            stop_loss: entry * dec!(0.9),
            take_profit: entry * dec!(1.2),
            unrealized_pnl: Decimal::ZERO,
            status: crate::positions::PositionStatus::Open,
            opened_at: trading_now(),
            updated_at: trading_now(),
            closed_at: None,
        });
    }

    #[test]
    fn check_names_serialize_like_as_str() {
        for check in RiskCheck::ALL {
            let json = serde_json::to_value(check).unwrap();
            assert_eq!(json, check.as_str());
            let back: RiskCheck = serde_json::from_value(json).unwrap();
            assert_eq!(back, check);
        }
    }

    #[test]
    fn clean_trade_passes_every_check() {
        let result = checker().validate(&good_signal(), &PositionBook::new(), trading_now());
        assert!(result.passed);
        assert!(result.failed_checks.is_empty());
        assert_eq!(result.checked_at, trading_now());
    }

    #[test]
    fn off_hours_fails_only_the_time_check() {
        // 03:00 IST is 21:30 UTC the previous evening (a Monday night).
        let small_hours = Utc.with_ymd_and_hms(2024, 1, 1, 21, 30, 0).unwrap();
        let result = checker().validate(&good_signal(), &PositionBook::new(), small_hours);
        assert!(!result.passed);
        assert_eq!(result.failed_checks, vec![RiskCheck::Time]);
    }

    #[test]
    fn no_trade_buffers_cut_the_session_edges() {
        let checker = checker();
        // 09:17 IST: market open but inside the entry buffer.
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 47, 0).unwrap();
        assert!(!checker.check_time(early));
        // 09:20 IST exactly is allowed.
        let at_buffer = Utc.with_ymd_and_hms(2024, 1, 2, 3, 50, 0).unwrap();
        assert!(checker.check_time(at_buffer));
        // 15:20 IST: still open but past the late cutoff.
        let late = Utc.with_ymd_and_hms(2024, 1, 2, 9, 50, 0).unwrap();
        assert!(!checker.check_time(late));
        // 15:15 IST exactly is allowed.
        let at_late_buffer = Utc.with_ymd_and_hms(2024, 1, 2, 9, 45, 0).unwrap();
        assert!(checker.check_time(at_late_buffer));
    }

    #[test]
    fn per_symbol_position_limit() {
        let mut book = PositionBook::new();
        for _ in 0..3 {
            open_test_position(&mut book, "NIFTY", dec!(10), 75);
        }
        let result = checker().validate(&good_signal(), &book, trading_now());
        assert!(result.failed(RiskCheck::PositionLimit));

        // A different symbol is still allowed.
        let mut other = good_signal();
        other.symbol = "BANKNIFTY".to_string();
        let result = checker().validate(&other, &book, trading_now());
        assert!(result.passed);
    }

    #[test]
    fn total_position_limit() {
        let mut book = PositionBook::new();
        for i in 0..10 {
            open_test_position(&mut book, &format!("SYM{i}"), dec!(1), 75);
        }
        let result = checker().validate(&good_signal(), &book, trading_now());
        assert!(result.failed(RiskCheck::PositionLimit));
    }

    #[test]
    fn expensive_contract_fails_the_risk_limit() {
        // 70 * 75 = 5250 premium for one lot, over the 5000 cap.
        let mut signal = good_signal();
        signal.entry_price = dec!(70);
        let result = checker().validate(&signal, &PositionBook::new(), trading_now());
        assert!(result.failed(RiskCheck::RiskLimit));
    }

    #[test]
    fn exposure_cap_counts_existing_positions() {
        let mut book = PositionBook::new();
        // 48000 of open premium; a 3750 lot would breach 50000.
        open_test_position(&mut book, "BANKNIFTY", dec!(640), 75);
        let result = checker().validate(&good_signal(), &book, trading_now());
        assert!(result.failed(RiskCheck::RiskLimit));
    }

    #[test]
    fn daily_loss_boundary_is_strict() {
        let checker = checker();
        let mut book = PositionBook::new();
        book.record_realized(dec!(-14999));
        assert!(checker.validate(&good_signal(), &book, trading_now()).passed);

        book.record_realized(dec!(-1));
        // Exactly -15000 is already a breach.
        let result = checker.validate(&good_signal(), &book, trading_now());
        assert!(result.failed(RiskCheck::DailyLoss));

        let mut worse = PositionBook::new();
        worse.record_realized(dec!(-15001));
        let result = checker.validate(&good_signal(), &worse, trading_now());
        assert!(result.failed(RiskCheck::DailyLoss));
    }

    #[test]
    fn illiquid_contract_fails_liquidity() {
        let mut signal = good_signal();
        signal.volume = 999;
        let result = checker().validate(&signal, &PositionBook::new(), trading_now());
        assert!(result.failed(RiskCheck::Liquidity));

        let mut signal = good_signal();
        signal.open_interest = 4999;
        let result = checker().validate(&signal, &PositionBook::new(), trading_now());
        assert!(result.failed(RiskCheck::Liquidity));
    }

    #[test]
    fn wide_or_crossed_spread_fails() {
        // 4 wide on a 50 premium is 8%, over the 5% cap.
        let mut signal = good_signal();
        signal.bid = dec!(48);
        signal.ask = dec!(52);
        let result = checker().validate(&signal, &PositionBook::new(), trading_now());
        assert!(result.failed(RiskCheck::Spread));

        let mut signal = good_signal();
        signal.bid = dec!(50);
        signal.ask = dec!(49);
        let result = checker().validate(&signal, &PositionBook::new(), trading_now());
        assert!(result.failed(RiskCheck::Spread));
    }

    #[test]
    fn iv_band_boundaries_pass() {
        let checker = checker();
        for iv in [5.0, 50.0] {
            let mut signal = good_signal();
            signal.implied_volatility = iv;
            let result = checker.validate(&signal, &PositionBook::new(), trading_now());
            assert!(result.passed, "iv {iv} should pass");
        }
        for iv in [4.9, 50.1] {
            let mut signal = good_signal();
            signal.implied_volatility = iv;
            let result = checker.validate(&signal, &PositionBook::new(), trading_now());
            assert!(result.failed(RiskCheck::Volatility), "iv {iv} should fail");
        }
    }

    #[test]
    fn failures_accumulate_across_checks() {
        let mut signal = good_signal();
        signal.volume = 0;
        signal.open_interest = 0;
        signal.implied_volatility = 80.0;
        signal.bid = dec!(40);
        signal.ask = dec!(52);

        let mut book = PositionBook::new();
        book.record_realized(dec!(-20000));

        let result = checker().validate(&signal, &book, trading_now());
        assert!(!result.passed);
        assert_eq!(
            result.failed_checks,
            vec![
                RiskCheck::DailyLoss,
                RiskCheck::Liquidity,
                RiskCheck::Spread,
                RiskCheck::Volatility,
            ]
        );
    }
}
