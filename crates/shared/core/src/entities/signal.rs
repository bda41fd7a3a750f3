//! Signals - what the strategy layer produces
//!
//! Strategies don't place orders directly. They emit entry and exit
//! signals; the trade engine decides whether and how to act on them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Request to open a position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySignal {
    pub symbol: String,
    pub side: Side,
    /// Stop distance in pips; the risk manager turns this into a size
    pub stop_distance_pips: Decimal,
    /// Confidence in the signal (0.0 - 1.0)
    pub confidence: Decimal,
    /// Optional take-profit distance in pips
    pub take_profit_pips: Option<Decimal>,
    /// Identifies the emitting strategy; part of the idempotency key
    pub strategy_tag: String,
    pub timestamp: DateTime<Utc>,
}

impl EntrySignal {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        stop_distance_pips: Decimal,
        strategy_tag: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            stop_distance_pips,
            confidence: Decimal::ONE,
            take_profit_pips: None,
            strategy_tag: strategy_tag.into(),
            timestamp: Utc::now(),
        }
    }

    /// Builder: set confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }

    /// Builder: set take-profit distance
    pub fn with_take_profit(mut self, pips: Decimal) -> Self {
        self.take_profit_pips = Some(pips);
        self
    }

    /// Builder: set the signal timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Request to close an open trade, fully or partially
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSignal {
    pub symbol: String,
    pub trade_id: String,
    /// Why the strategy wants out (trailing stop hit, session close, ...)
    pub reason: String,
    /// None closes the full position
    pub lots: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl ExitSignal {
    pub fn new(
        symbol: impl Into<String>,
        trade_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            trade_id: trade_id.into(),
            reason: reason.into(),
            lots: None,
            timestamp: Utc::now(),
        }
    }

    /// Builder: close only part of the position
    pub fn partial(mut self, lots: Decimal) -> Self {
        self.lots = Some(lots);
        self
    }
}

/// A strategy signal consumed by the trade engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Signal {
    Entry(EntrySignal),
    Exit(ExitSignal),
}

impl Signal {
    pub fn symbol(&self) -> &str {
        match self {
            Signal::Entry(s) => &s.symbol,
            Signal::Exit(s) => &s.symbol,
        }
    }
}
