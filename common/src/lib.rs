//! Shared domain types for the options signal and risk stack.
//!
//! Everything here is plain data: the option-chain row shape, the seven
//! scored parameters and their weights, emitted signals, exit reasons,
//! and the exchange session clock. The scoring, learning and risk
//! crates all build on these types.

pub mod error;
pub mod hours;
pub mod types;

pub use error::ValidationError;
pub use hours::MarketHours;
pub use types::{
    ExitReason, OptionQuote, OptionType, Parameter, ParameterScores, Signal, TradeAction,
    WeightVector,
};

// Re-exported so downstream crates agree on the uuid version.
pub use uuid::Uuid;
