//! Risk gate configuration with sensible NSE options defaults.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use common::MarketHours;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete risk gate configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RiskConfig {
    #[serde(default)]
    pub limits: RiskLimits,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Hard limits applied to every trade and to the portfolio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskLimits {
    /// Maximum rupee risk on a single trade (one lot of premium)
    #[serde(default = "default_max_loss_per_trade")]
    pub max_loss_per_trade: f64,
    /// Daily realized loss budget; trading stops once breached
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: f64,
    /// Total open premium exposure cap
    #[serde(default = "default_max_portfolio_risk")]
    pub max_portfolio_risk: f64,
    #[serde(default = "default_max_positions_per_symbol")]
    pub max_positions_per_symbol: usize,
    #[serde(default = "default_max_total_positions")]
    pub max_total_positions: usize,
    /// Minimum session volume on the contract
    #[serde(default = "default_min_volume")]
    pub min_volume: u64,
    #[serde(default = "default_min_open_interest")]
    pub min_open_interest: u64,
    /// Maximum bid-ask spread as a fraction of last traded price
    #[serde(default = "default_max_bid_ask_spread")]
    pub max_bid_ask_spread: f64,
    /// Acceptable IV band, in percent
    #[serde(default = "default_min_iv")]
    pub min_iv: f64,
    #[serde(default = "default_max_iv")]
    pub max_iv: f64,
    /// Fraction of available capital risked per trade
    #[serde(default = "default_position_size_percent")]
    pub position_size_percent: f64,
    /// Stop distance as a fraction of entry premium
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: f64,
    /// Target distance as a fraction of entry premium
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: f64,
    /// Contract units per lot (NIFTY: 75)
    #[serde(default = "default_lot_size")]
    pub lot_size: u32,
}

fn default_max_loss_per_trade() -> f64 {
    5000.0
}

fn default_max_daily_loss() -> f64 {
    15000.0
}

fn default_max_portfolio_risk() -> f64 {
    50000.0
}

fn default_max_positions_per_symbol() -> usize {
    3
}

fn default_max_total_positions() -> usize {
    10
}

fn default_min_volume() -> u64 {
    1000
}

fn default_min_open_interest() -> u64 {
    5000
}

fn default_max_bid_ask_spread() -> f64 {
    0.05
}

fn default_min_iv() -> f64 {
    5.0
}

fn default_max_iv() -> f64 {
    50.0
}

fn default_position_size_percent() -> f64 {
    0.02
}

fn default_stop_loss_percent() -> f64 {
    0.10
}

fn default_take_profit_percent() -> f64 {
    0.20
}

fn default_lot_size() -> u32 {
    75
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_loss_per_trade: default_max_loss_per_trade(),
            max_daily_loss: default_max_daily_loss(),
            max_portfolio_risk: default_max_portfolio_risk(),
            max_positions_per_symbol: default_max_positions_per_symbol(),
            max_total_positions: default_max_total_positions(),
            min_volume: default_min_volume(),
            min_open_interest: default_min_open_interest(),
            max_bid_ask_spread: default_max_bid_ask_spread(),
            min_iv: default_min_iv(),
            max_iv: default_max_iv(),
            position_size_percent: default_position_size_percent(),
            stop_loss_percent: default_stop_loss_percent(),
            take_profit_percent: default_take_profit_percent(),
            lot_size: default_lot_size(),
        }
    }
}

/// Session timing constraints layered on top of market hours
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// No entries before this local time (skip the opening churn)
    #[serde(default = "default_no_trade_before")]
    pub no_trade_before: NaiveTime,
    /// No entries after this local time (avoid expiry-hour spikes)
    #[serde(default = "default_no_trade_after")]
    pub no_trade_after: NaiveTime,
    #[serde(default)]
    pub hours: MarketHours,
}

fn default_no_trade_before() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 20, 0).unwrap()
}

fn default_no_trade_after() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 15, 0).unwrap()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            no_trade_before: default_no_trade_before(),
            no_trade_after: default_no_trade_after(),
            hours: MarketHours::default(),
        }
    }
}

/// Load configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RiskConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read config file: {:?}", path.as_ref()))?;
    let config: RiskConfig =
        toml::from_str(&content).with_context(|| "failed to parse config file")?;
    Ok(config)
}

/// Save configuration to a TOML file.
pub fn save_config<P: AsRef<Path>>(path: P, config: &RiskConfig) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path.as_ref(), content)
        .with_context(|| format!("failed to write config file: {:?}", path.as_ref()))?;
    Ok(())
}

/// Write a fully commented template to the given path.
pub fn create_config_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let template = r#"# Risk Gate Configuration

[limits]
# Maximum rupee risk on a single trade (one lot of premium)
max_loss_per_trade = 5000.0

# Daily realized loss budget; trading stops once breached
max_daily_loss = 15000.0

# Total open premium exposure cap
max_portfolio_risk = 50000.0

max_positions_per_symbol = 3
max_total_positions = 10

# Contract liquidity floors
min_volume = 1000
min_open_interest = 5000

# Maximum bid-ask spread as a fraction of last traded price
max_bid_ask_spread = 0.05

# Acceptable IV band, in percent
min_iv = 5.0
max_iv = 50.0

# Fraction of available capital risked per trade
position_size_percent = 0.02

# Exit distances as fractions of entry premium
stop_loss_percent = 0.10
take_profit_percent = 0.20

# Contract units per lot (NIFTY: 75)
lot_size = 75

[session]
# No entries before / after these exchange-local times
no_trade_before = "09:20:00"
no_trade_after = "15:15:00"

[session.hours]
open = "09:15:00"
close = "15:30:00"
# Exchange UTC offset in minutes (IST = +330)
utc_offset_minutes = 330
"#;

    std::fs::write(path.as_ref(), template)
        .with_context(|| format!("failed to write config template: {:?}", path.as_ref()))?;
    Ok(())
}
