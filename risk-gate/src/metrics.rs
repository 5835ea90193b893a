//! Portfolio summaries and risk posture reporting.

use crate::config::RiskLimits;
use crate::positions::PositionBook;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of exposure and loss-budget utilization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub open_positions: usize,
    /// Total premium at risk across open positions
    pub total_exposure: Decimal,
    pub unrealized_pnl: Decimal,
    pub daily_realized_pnl: Decimal,
    /// Percent of the portfolio exposure budget consumed
    pub risk_utilization: f64,
    /// Percent of the daily loss budget consumed
    pub daily_loss_utilization: f64,
}

/// Derived risk posture of the open book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Most negative open unrealized P&L, or zero when nothing is under water
    pub worst_open_drawdown: Decimal,
    /// Fraction of open positions currently in profit
    pub open_win_rate: f64,
    pub average_position_cost: Decimal,
    /// Configured reward to risk (take profit over stop loss distance)
    pub risk_reward_ratio: f64,
    /// Open positions carrying more than half the per-trade loss cap
    pub positions_at_risk: usize,
}

pub fn portfolio_summary(book: &PositionBook, limits: &RiskLimits) -> PortfolioSummary {
    let exposure = book.total_exposure();
    let daily = book.daily_realized_pnl();

    let risk_utilization = if limits.max_portfolio_risk > 0.0 {
        exposure.to_f64().unwrap_or(0.0) / limits.max_portfolio_risk * 100.0
    } else {
        0.0
    };
    let daily_loss_utilization = if limits.max_daily_loss > 0.0 {
        daily.to_f64().unwrap_or(0.0).abs() / limits.max_daily_loss * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        open_positions: book.open_count(),
        total_exposure: exposure,
        unrealized_pnl: book.unrealized_pnl(),
        daily_realized_pnl: daily,
        risk_utilization,
        daily_loss_utilization,
    }
}

pub fn risk_report(book: &PositionBook, limits: &RiskLimits) -> RiskReport {
    let open = book.open_count();

    let worst_open_drawdown = book
        .positions()
        .values()
        .map(|p| p.unrealized_pnl)
        .min()
        .unwrap_or_default()
        .min(Decimal::ZERO);

    let winners = book
        .positions()
        .values()
        .filter(|p| p.unrealized_pnl > Decimal::ZERO)
        .count();
    let open_win_rate = if open > 0 {
        winners as f64 / open as f64
    } else {
        0.0
    };

    let average_position_cost = if open > 0 {
        book.total_exposure() / Decimal::from(open as u64)
    } else {
        Decimal::ZERO
    };

    let risk_reward_ratio = if limits.stop_loss_percent > 0.0 {
        limits.take_profit_percent / limits.stop_loss_percent
    } else {
        0.0
    };

    let at_risk_threshold = limits.max_loss_per_trade * 0.5;
    let positions_at_risk = book
        .positions()
        .values()
        .filter(|p| p.unrealized_pnl.to_f64().unwrap_or(0.0) < -at_risk_threshold)
        .count();

    RiskReport {
        worst_open_drawdown,
        open_win_rate,
        average_position_cost,
        risk_reward_ratio,
        positions_at_risk,
    }
}
