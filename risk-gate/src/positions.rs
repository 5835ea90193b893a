//! Position tracking and the daily realized P&L ledger.

use chrono::{DateTime, Utc};
use common::{ExitReason, OptionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle state of a tracked position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One option position sized in contract units (lots x lot size)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub quantity: u32,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub unrealized_pnl: Decimal,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Premium paid to open: entry price times quantity.
    pub fn cost(&self) -> Decimal {
        self.entry_price * Decimal::from(self.quantity)
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Alert raised when a mark crosses a stop or target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitAlert {
    pub position_id: Uuid,
    pub symbol: String,
    pub reason: ExitReason,
    pub price: Decimal,
    pub message: String,
}

/// Open positions plus the day's realized P&L
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<Uuid, Position>,
    daily_realized_pnl: Decimal,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, position: Position) {
        debug!(
            id = %position.id,
            symbol = %position.symbol,
            quantity = position.quantity,
            entry = %position.entry_price,
            "position opened"
        );
        self.positions.insert(position.id, position);
    }

    /// Closes a position at the given price, removes it from the book,
    /// and rolls its P&L into the daily ledger. Returns the realized
    /// P&L, or None for an unknown id.
    pub fn close(
        &mut self,
        id: Uuid,
        exit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Decimal> {
        let position = self.positions.get_mut(&id)?;
        let pnl = (exit_price - position.entry_price) * Decimal::from(position.quantity);
        position.status = PositionStatus::Closed;
        position.current_price = exit_price;
        position.unrealized_pnl = Decimal::ZERO;
        position.updated_at = now;
        position.closed_at = Some(now);
        self.daily_realized_pnl += pnl;
        self.positions.remove(&id);
        info!(%id, exit = %exit_price, pnl = %pnl, "position closed");
        Some(pnl)
    }

    /// Marks a position to the latest price. Returns false for an
    /// unknown id.
    pub fn update_price(&mut self, id: Uuid, price: Decimal, now: DateTime<Utc>) -> bool {
        let Some(position) = self.positions.get_mut(&id) else {
            return false;
        };
        position.current_price = price;
        position.unrealized_pnl =
            (price - position.entry_price) * Decimal::from(position.quantity);
        position.updated_at = now;
        true
    }

    /// Stops and targets crossed by the current marks.
    pub fn exit_alerts(&self) -> Vec<ExitAlert> {
        let mut alerts = Vec::new();
        for position in self.positions.values() {
            if position.current_price <= position.stop_loss {
                alerts.push(ExitAlert {
                    position_id: position.id,
                    symbol: position.symbol.clone(),
                    reason: ExitReason::StopLoss,
                    price: position.current_price,
                    message: format!(
                        "Stop loss hit for {} {} {}",
                        position.symbol, position.strike, position.option_type
                    ),
                });
            } else if position.current_price >= position.take_profit {
                alerts.push(ExitAlert {
                    position_id: position.id,
                    symbol: position.symbol.clone(),
                    reason: ExitReason::TargetHit,
                    price: position.current_price,
                    message: format!(
                        "Take profit hit for {} {} {}",
                        position.symbol, position.strike, position.option_type
                    ),
                });
            }
        }
        alerts
    }

    pub fn get(&self, id: Uuid) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn positions(&self) -> &HashMap<Uuid, Position> {
        &self.positions
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn count_for_symbol(&self, symbol: &str) -> usize {
        self.positions.values().filter(|p| p.symbol == symbol).count()
    }

    /// Total premium at risk across open positions.
    pub fn total_exposure(&self) -> Decimal {
        self.positions.values().map(|p| p.cost()).sum()
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.unrealized_pnl).sum()
    }

    pub fn daily_realized_pnl(&self) -> Decimal {
        self.daily_realized_pnl
    }

    /// Adds an externally realized amount to the daily ledger.
    pub fn record_realized(&mut self, pnl: Decimal) {
        self.daily_realized_pnl += pnl;
    }

    /// Zeroes the daily ledger at the start of a session.
    pub fn reset_daily(&mut self) {
        self.daily_realized_pnl = Decimal::ZERO;
    }

    /// Clones the open positions for persistence.
    pub fn snapshot(&self) -> Vec<Position> {
        self.positions.values().cloned().collect()
    }

    /// Reloads open positions; closed entries in the input are dropped.
    pub fn restore(&mut self, positions: Vec<Position>) {
        self.positions = positions
            .into_iter()
            .filter(|p| p.is_open())
            .map(|p| (p.id, p))
            .collect();
    }
}
