//! Instrument contract data
//!
//! Everything the orchestrator needs to know about a tradeable symbol:
//! price precision, contract size, volume constraints, and pip value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-symbol contract specification as reported by the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    /// Decimal places in the quoted price (5 for EURUSD)
    pub digits: u32,
    /// One point of price movement (0.00001 for EURUSD)
    pub point: Decimal,
    /// Lot size in base units (100000 for EURUSD)
    pub contract_size: Decimal,
    /// Minimum volume increment
    pub lot_step: Decimal,
    /// Minimum volume the venue accepts
    pub min_lot: Decimal,
    /// Maximum volume the venue accepts
    pub max_lot: Decimal,
    /// Account-currency profit/loss of one pip on one lot
    pub pip_value_per_lot: Decimal,
}

impl SymbolSpec {
    /// Normalize a raw lot size to what the venue will accept.
    ///
    /// Rounds DOWN to the nearest `lot_step` so the sized position never
    /// risks more than requested, after flooring at `min_lot` and capping
    /// at `max_lot`. Returns zero when the input is zero or negative.
    pub fn clamp_lots(&self, raw: Decimal) -> Decimal {
        if raw <= Decimal::ZERO || self.lot_step <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let bounded = raw.max(self.min_lot).min(self.max_lot);
        (bounded / self.lot_step).floor() * self.lot_step
    }

    /// Distance between two prices expressed in pips
    pub fn pip_distance(&self, price_a: Decimal, price_b: Decimal) -> Decimal {
        if self.point.is_zero() {
            return Decimal::ZERO;
        }
        ((price_a - price_b).abs() / self.point).round_dp(1)
    }

    /// Account-currency loss of `lots` moving `stop_distance_pips` against us
    pub fn loss_for_stop(&self, lots: Decimal, stop_distance_pips: Decimal) -> Decimal {
        lots * stop_distance_pips * self.pip_value_per_lot
    }
}
