// Signal Engine (Layer 2)
// Scores option chains across seven parameters, aggregates the scores
// with learned weights, and emits ranked BUY/SELL signals.

pub mod engine;
pub mod scoring;

pub use engine::{EngineConfig, SignalEngine};
pub use scoring::{aggregate_confidence, score_quote};

// Commonly used alongside the engine.
pub use common::{OptionQuote, OptionType, Signal, TradeAction, WeightVector};
