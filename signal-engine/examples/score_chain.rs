// Example: Option Chain Scoring
// Scores a small NIFTY chain, prints the emitted signals, and feeds a
// couple of outcomes back into the learning loop.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use signal_engine::{
    EngineConfig, OptionQuote, OptionType, SignalEngine,
};
use common::ExitReason;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== Signal Engine - Chain Scoring Example ===\n");

    let underlying = dec!(22000);
    let chain = vec![
        // Deep ITM call with heavy OI buildup and good volume.
        OptionQuote {
            strike: dec!(21500),
            option_type: OptionType::Call,
            last_price: dec!(560),
            bid: dec!(558),
            ask: dec!(562),
            volume: 9000,
            open_interest: 15000,
            oi_change: 4000,
            implied_volatility: 19.5,
            delta: 0.78,
        },
        // ATM call, decent but mixed.
        OptionQuote {
            strike: dec!(22000),
            option_type: OptionType::Call,
            last_price: dec!(180),
            bid: dec!(179),
            ask: dec!(181),
            volume: 2500,
            open_interest: 22000,
            oi_change: 900,
            implied_volatility: 21.0,
            delta: 0.52,
        },
        // Far OTM put with a thin book.
        OptionQuote {
            strike: dec!(21000),
            option_type: OptionType::Put,
            last_price: dec!(35),
            bid: dec!(30),
            ask: dec!(41),
            volume: 400,
            open_interest: 8000,
            oi_change: 150,
            implied_volatility: 42.0,
            delta: -0.18,
        },
    ];

    // Tuesday 10:30 IST, inside market hours, so the run is repeatable.
    let now = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();

    let mut engine = SignalEngine::new(EngineConfig::default());
    let signals = engine.generate_signals("NIFTY", &chain, underlying, now);

    println!("Scanned {} contracts, emitted {} signals\n", chain.len(), signals.len());
    for signal in &signals {
        println!(
            "{} {} {} @ {} | confidence {:.1}",
            signal.action, signal.symbol, signal.strike, signal.entry_price, signal.confidence
        );
        println!("  {}", signal.reasoning);
    }

    // Feed an outcome back; after enough of these the weights adapt.
    if let Some(signal) = signals.first() {
        engine
            .record_outcome(signal.id, ExitReason::TargetHit, dec!(420))
            .await?;
        println!("\nRecorded outcome for {} ({} record in log)", signal.id, engine.recorder().log().len());
    }

    println!("\nCurrent weights: {:?}", engine.weights());
    Ok(())
}
