//! Lot sizing and exit price derivation.

use crate::config::RiskLimits;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Lots affordable under the per-trade budget: the smaller of the
/// capital slice and the per-trade loss cap, floored to whole lots.
/// Any positive budget buys at least one lot; zero capital buys none.
pub fn position_size_lots(price: Decimal, available_capital: Decimal, limits: &RiskLimits) -> u32 {
    if available_capital <= Decimal::ZERO {
        return 0;
    }
    let price_per_lot = (price * Decimal::from(limits.lot_size))
        .to_f64()
        .unwrap_or(f64::MAX);
    if price_per_lot <= 0.0 {
        return 1;
    }
    let capital_slice =
        available_capital.to_f64().unwrap_or(0.0) * limits.position_size_percent;
    let budget = capital_slice.min(limits.max_loss_per_trade);
    let lots = (budget / price_per_lot) as u32;
    lots.max(1)
}

/// Stop on the premium path, identical for calls and puts.
pub fn stop_loss_price(entry_price: Decimal, limits: &RiskLimits) -> Decimal {
    let factor = Decimal::ONE - Decimal::from_f64(limits.stop_loss_percent).unwrap_or_default();
    entry_price * factor
}

/// Target on the premium path, identical for calls and puts.
pub fn take_profit_price(entry_price: Decimal, limits: &RiskLimits) -> Decimal {
    let factor = Decimal::ONE + Decimal::from_f64(limits.take_profit_percent).unwrap_or_default();
    entry_price * factor
}
