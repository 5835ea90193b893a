use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Side of an option contract
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OptionType {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PUT")]
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action attached to an emitted signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TradeAction {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "HOLD")]
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of an option chain as fed to the scoring engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionQuote {
    pub strike: Decimal,
    pub option_type: OptionType,
    /// Last traded price of the contract
    pub last_price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: u64,
    pub open_interest: u64,
    /// Net open interest change over the session, signed
    pub oi_change: i64,
    /// Implied volatility in percent (e.g. 18.5)
    pub implied_volatility: f64,
    pub delta: f64,
}

/// The seven scored parameters, in aggregation order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Delta,
    OiChange,
    Volume,
    Momentum,
    Iv,
    Spread,
    Liquidity,
}

impl Parameter {
    pub const ALL: [Parameter; 7] = [
        Parameter::Delta,
        Parameter::OiChange,
        Parameter::Volume,
        Parameter::Momentum,
        Parameter::Iv,
        Parameter::Spread,
        Parameter::Liquidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Delta => "delta",
            Parameter::OiChange => "oi_change",
            Parameter::Volume => "volume",
            Parameter::Momentum => "momentum",
            Parameter::Iv => "iv",
            Parameter::Spread => "spread",
            Parameter::Liquidity => "liquidity",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-parameter scores for one contract, each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ParameterScores {
    pub delta: f64,
    pub oi_change: f64,
    pub volume: f64,
    pub momentum: f64,
    pub iv: f64,
    pub spread: f64,
    pub liquidity: f64,
}

impl ParameterScores {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Delta => self.delta,
            Parameter::OiChange => self.oi_change,
            Parameter::Volume => self.volume,
            Parameter::Momentum => self.momentum,
            Parameter::Iv => self.iv,
            Parameter::Spread => self.spread,
            Parameter::Liquidity => self.liquidity,
        }
    }

    pub fn set(&mut self, parameter: Parameter, score: f64) {
        match parameter {
            Parameter::Delta => self.delta = score,
            Parameter::OiChange => self.oi_change = score,
            Parameter::Volume => self.volume = score,
            Parameter::Momentum => self.momentum = score,
            Parameter::Iv => self.iv = score,
            Parameter::Spread => self.spread = score,
            Parameter::Liquidity => self.liquidity = score,
        }
    }
}

/// Aggregation weights over the seven parameters
///
/// Weights are non-negative and sum to 1.0. The default vector is the
/// hand-tuned prior used before any outcome learning has run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightVector {
    pub delta: f64,
    pub oi_change: f64,
    pub volume: f64,
    pub momentum: f64,
    pub iv: f64,
    pub spread: f64,
    pub liquidity: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            delta: 0.25,
            oi_change: 0.20,
            volume: 0.15,
            momentum: 0.15,
            iv: 0.10,
            spread: 0.10,
            liquidity: 0.05,
        }
    }
}

impl WeightVector {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Delta => self.delta,
            Parameter::OiChange => self.oi_change,
            Parameter::Volume => self.volume,
            Parameter::Momentum => self.momentum,
            Parameter::Iv => self.iv,
            Parameter::Spread => self.spread,
            Parameter::Liquidity => self.liquidity,
        }
    }

    pub fn set(&mut self, parameter: Parameter, weight: f64) {
        match parameter {
            Parameter::Delta => self.delta = weight,
            Parameter::OiChange => self.oi_change = weight,
            Parameter::Volume => self.volume = weight,
            Parameter::Momentum => self.momentum = weight,
            Parameter::Iv => self.iv = weight,
            Parameter::Spread => self.spread = weight,
            Parameter::Liquidity => self.liquidity = weight,
        }
    }

    pub fn sum(&self) -> f64 {
        Parameter::ALL.iter().map(|p| self.get(*p)).sum()
    }

    /// Rescales all weights so they sum to 1.0. A degenerate all-zero
    /// vector falls back to the default prior.
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total <= f64::EPSILON {
            *self = Self::default();
            return;
        }
        for parameter in Parameter::ALL {
            self.set(parameter, self.get(parameter) / total);
        }
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-9
    }
}

/// An emitted trading signal
///
/// Confidence is stored on a 0-100 scale for display; the generation
/// threshold operates on the raw 0-1 aggregate before scaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub action: TradeAction,
    /// Aggregated confidence, 0-100
    pub confidence: f64,
    /// Human-readable summary of the strongest and weakest parameters
    pub reasoning: String,
    pub parameters: ParameterScores,
    pub entry_price: Decimal,
    pub underlying_price: Decimal,
    pub volume: u64,
    pub open_interest: u64,
    pub bid: Decimal,
    pub ask: Decimal,
    pub implied_volatility: f64,
    pub created_at: DateTime<Utc>,
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExitReason {
    TargetHit,
    StopLoss,
    Manual,
    Expired,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TargetHit => "target_hit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::Manual => "manual",
            ExitReason::Expired => "expired",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
