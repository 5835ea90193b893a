//! Example usage of the risk gate: validate, size, open, track, close.

use chrono::{TimeZone, Utc};
use common::{ExitReason, OptionType, ParameterScores, Signal, TradeAction, Uuid};
use risk_gate::{RiskConfig, RiskGate, RiskLimits};
use rust_decimal_macros::dec;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== Risk Gate Example ===\n");

    // Tuesday 10:30 IST so the session check passes on every run.
    let now = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();

    // Example 1: Validate a candidate trade
    println!("Example 1: Validating a Candidate Trade");
    let mut gate = RiskGate::new();
    let signal = Signal {
        id: Uuid::new_v4(),
        symbol: "NIFTY".to_string(),
        strike: dec!(22000),
        option_type: OptionType::Call,
        action: TradeAction::Buy,
        confidence: 82.0,
        reasoning: "Strong Delta indicating good directional bias".to_string(),
        parameters: ParameterScores::default(),
        entry_price: dec!(50),
        underlying_price: dec!(22150),
        volume: 2500,
        open_interest: 18000,
        bid: dec!(49.75),
        ask: dec!(50.25),
        implied_volatility: 19.5,
        created_at: now,
    };

    let result = gate.validate_trade(&signal, now);
    if result.passed {
        println!("  ✓ All checks passed\n");
    } else {
        println!("  ✗ Failed checks:");
        for check in &result.failed_checks {
            println!("    - {}", check);
        }
        println!();
    }

    // Example 2: Size the position
    println!("Example 2: Position Sizing");
    let capital = dec!(200000);
    let lots = gate.position_size_lots(signal.entry_price, capital);
    println!("  Capital: {}", capital);
    println!("  Lots: {} ({} units)\n", lots, lots * gate.limits().lot_size);

    // Example 3: Open, mark and close
    println!("Example 3: Position Lifecycle");
    let id = gate.open_position(&signal, lots, now);
    let position = gate.book().get(id).unwrap();
    println!("  Opened {} @ {}", position.symbol, position.entry_price);
    println!("  Stop: {}  Target: {}", position.stop_loss, position.take_profit);

    gate.update_price(id, dec!(61), now);
    for alert in gate.exit_alerts() {
        println!("  Alert: {}", alert.message);
    }

    if let Some(pnl) = gate.close_position(id, dec!(61), ExitReason::TargetHit, now) {
        println!("  Closed with P&L: {}\n", pnl);
    }

    // Example 4: Portfolio summary
    println!("Example 4: Portfolio Summary");
    let summary = gate.summary();
    println!("  Open positions: {}", summary.open_positions);
    println!("  Exposure: {}", summary.total_exposure);
    println!("  Daily realized P&L: {}", summary.daily_realized_pnl);
    println!(
        "  Daily loss budget used: {:.1}%\n",
        summary.daily_loss_utilization
    );

    // Example 5: Custom limits reject an illiquid contract
    println!("Example 5: Custom Limits");
    let custom = RiskConfig {
        limits: RiskLimits {
            min_volume: 5000,
            min_open_interest: 25000,
            ..Default::default()
        },
        ..Default::default()
    };
    let strict_gate = RiskGate::with_config(custom);
    let result = strict_gate.validate_trade(&signal, now);
    match result.passed {
        true => println!("  Unexpected: trade approved\n"),
        false => {
            println!("  ✗ Rejected by stricter limits:");
            for check in &result.failed_checks {
                println!("    - {}", check);
            }
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
