//! Runner configuration
//!
//! One TOML file describes the whole deployment. Every field has a
//! default, so an empty file (or none at all) yields a working paper
//! setup. Environment variables prefixed `HERMES_` override file values,
//! with `__` as the section separator (`HERMES_RISK__PER_TRADE_PCT=1.0`).

use config::{Config, Environment, File};
use hermes_core::SymbolSpec;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;
use crate::replay::ReplayEntry;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    pub app: AppConfig,
    pub risk: RiskSection,
    pub venue: VenueConfig,
    pub journal: JournalConfig,
    pub telegram: TelegramConfig,
    /// Scripted entry signals for the replay source
    pub replay: Vec<ReplayEntry>,
}

impl RunnerConfig {
    /// Load from an optional TOML file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("HERMES").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<SymbolConfig>,
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: vec![SymbolConfig::default()],
            poll_interval_ms: 1_000,
        }
    }
}

/// Contract data for one paper-venue symbol. The defaults describe a
/// 5-digit FX major.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    pub name: String,
    pub digits: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub point: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub contract_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lot_step: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_lot: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_lot: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pip_value_per_lot: Decimal,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            name: "EURUSD".to_string(),
            digits: 5,
            point: dec!(0.00001),
            contract_size: dec!(100000),
            lot_step: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
            pip_value_per_lot: dec!(10),
        }
    }
}

impl SymbolConfig {
    pub fn to_spec(&self) -> SymbolSpec {
        SymbolSpec {
            symbol: self.name.clone(),
            digits: self.digits,
            point: self.point,
            contract_size: self.contract_size,
            lot_step: self.lot_step,
            min_lot: self.min_lot,
            max_lot: self.max_lot,
            pip_value_per_lot: self.pip_value_per_lot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    #[serde(with = "rust_decimal::serde::float")]
    pub per_trade_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub per_day_pct: Decimal,
    pub max_active_trades: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_risk_increment: Decimal,
    pub dynamic: DynamicRiskConfig,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            per_trade_pct: dec!(0.5),
            per_day_pct: dec!(2.0),
            max_active_trades: 4,
            min_risk_increment: dec!(0.01),
            dynamic: DynamicRiskConfig::default(),
        }
    }
}

/// Drawdown-scaled risk reduction, off by default
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamicRiskConfig {
    pub enabled: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub drawdown_threshold_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub reduce_factor: Decimal,
    pub window: usize,
}

impl Default for DynamicRiskConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            drawdown_threshold_pct: dec!(1.0),
            reduce_factor: dec!(0.5),
            window: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    /// Starting equity of the paper account
    #[serde(with = "rust_decimal::serde::float")]
    pub equity: Decimal,
    pub order_timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub day_boundary_offset_minutes: i64,
    pub idempotency_bucket_secs: i64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            equity: dec!(10000),
            order_timeout_ms: 30_000,
            max_attempts: 4,
            backoff_base_ms: 250,
            backoff_cap_ms: 5_000,
            day_boundary_offset_minutes: 0,
            idempotency_bucket_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub path: String,
    pub rotate_daily: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: "./journal".to_string(),
            rotate_daily: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    /// Token and chat id may also come from TELEGRAM_BOT_TOKEN /
    /// TELEGRAM_CHAT_ID
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Identical alerts within this window are delivered once
    pub throttle_secs: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> RunnerConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_empty_config_yields_working_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.app.symbols.len(), 1);
        assert_eq!(cfg.app.symbols[0].name, "EURUSD");
        assert_eq!(cfg.risk.per_trade_pct, dec!(0.5));
        assert_eq!(cfg.venue.order_timeout_ms, 30_000);
        assert!(!cfg.telegram.enabled);
        assert!(cfg.replay.is_empty());
    }

    #[test]
    fn test_full_config_parses() {
        let cfg = parse(
            r#"
            [app]
            poll_interval_ms = 500

            [[app.symbols]]
            name = "GBPUSD"

            [[app.symbols]]
            name = "USDJPY"
            digits = 3
            point = 0.001
            pip_value_per_lot = 9.1

            [risk]
            per_trade_pct = 1.0
            max_active_trades = 2

            [risk.dynamic]
            enabled = true
            reduce_factor = 0.25

            [venue]
            equity = 25000
            max_attempts = 6

            [journal]
            path = "/tmp/hermes-journal"
            rotate_daily = false

            [[replay]]
            cycle = 3
            symbol = "GBPUSD"
            side = "Buy"
            stop_pips = 15.0
            "#,
        );

        assert_eq!(cfg.app.poll_interval_ms, 500);
        assert_eq!(cfg.app.symbols.len(), 2);
        assert_eq!(cfg.app.symbols[1].digits, 3);
        assert_eq!(cfg.risk.per_trade_pct, dec!(1.0));
        assert!(cfg.risk.dynamic.enabled);
        assert_eq!(cfg.risk.dynamic.reduce_factor, dec!(0.25));
        assert_eq!(cfg.venue.equity, dec!(25000));
        assert_eq!(cfg.venue.max_attempts, 6);
        assert!(!cfg.journal.rotate_daily);
        assert_eq!(cfg.replay.len(), 1);
        assert_eq!(cfg.replay[0].cycle, 3);
    }
}
