//! Per-day risk ledger
//!
//! One [`RiskAccount`] per trading day. Fields are private and mutation
//! is crate-internal: everything outside this crate goes through
//! [`RiskManager`](crate::RiskManager), which preserves the ledger
//! invariants at every return point:
//!
//! - sum of active reservations <= `daily_risk_used` <= `daily_risk_limit`
//! - number of active trades <= `max_active_trades`

use chrono::{DateTime, Utc};
use hermes_core::{Side, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Risk reserved for one open trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub trade_id: TradeId,
    pub symbol: String,
    pub side: Side,
    /// Account currency reserved at entry (worst-case loss to the stop)
    pub risk_amount: Decimal,
    pub lots: Decimal,
    pub stop_distance_pips: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// Daily risk ledger for one account
#[derive(Debug, Clone)]
pub struct RiskAccount {
    equity: Decimal,
    daily_risk_limit: Decimal,
    daily_risk_used: Decimal,
    active_trades: HashMap<TradeId, ActiveTrade>,
    max_active_trades: usize,
    day_started_at: DateTime<Utc>,
}

impl RiskAccount {
    /// Open a fresh ledger, snapshotting the daily limit from equity
    pub fn open(
        equity: Decimal,
        per_day_pct: Decimal,
        max_active_trades: usize,
        day_started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            equity,
            daily_risk_limit: equity * per_day_pct / Decimal::ONE_HUNDRED,
            daily_risk_used: Decimal::ZERO,
            active_trades: HashMap::new(),
            max_active_trades,
            day_started_at,
        }
    }

    pub fn equity(&self) -> Decimal {
        self.equity
    }

    pub fn daily_risk_limit(&self) -> Decimal {
        self.daily_risk_limit
    }

    pub fn daily_risk_used(&self) -> Decimal {
        self.daily_risk_used
    }

    pub fn day_started_at(&self) -> DateTime<Utc> {
        self.day_started_at
    }

    pub fn max_active_trades(&self) -> usize {
        self.max_active_trades
    }

    pub fn active_trade_count(&self) -> usize {
        self.active_trades.len()
    }

    pub fn active_trade(&self, trade_id: &str) -> Option<&ActiveTrade> {
        self.active_trades.get(trade_id)
    }

    pub fn active_trades(&self) -> impl Iterator<Item = &ActiveTrade> {
        self.active_trades.values()
    }

    /// Total currency reserved across open trades
    pub fn reserved_total(&self) -> Decimal {
        self.active_trades.values().map(|t| t.risk_amount).sum()
    }

    // Crate-internal mutation. The manager checks preconditions before
    // calling these; the ledger only enforces the arithmetic.

    pub(crate) fn insert_trade(&mut self, trade: ActiveTrade) {
        self.daily_risk_used += trade.risk_amount;
        self.active_trades.insert(trade.trade_id.clone(), trade);
    }

    pub(crate) fn remove_trade(&mut self, trade_id: &str) -> Option<ActiveTrade> {
        self.active_trades.remove(trade_id)
    }

    /// Consume budget beyond what a removed reservation already covered,
    /// capped so `daily_risk_used` never exceeds the daily limit.
    pub(crate) fn consume_excess_loss(&mut self, excess: Decimal) {
        self.daily_risk_used = (self.daily_risk_used + excess).min(self.daily_risk_limit);
    }

    /// Give back the reservation of a trade that never filled
    pub(crate) fn refund(&mut self, amount: Decimal) {
        self.daily_risk_used = (self.daily_risk_used - amount).max(Decimal::ZERO);
    }

    pub(crate) fn set_equity(&mut self, equity: Decimal) {
        self.equity = equity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(id: &str, risk: Decimal) -> ActiveTrade {
        ActiveTrade {
            trade_id: id.to_string(),
            symbol: "EURUSD".to_string(),
            side: Side::Buy,
            risk_amount: risk,
            lots: dec!(0.10),
            stop_distance_pips: dec!(20),
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_snapshots_limit_from_equity() {
        let account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        assert_eq!(account.daily_risk_limit(), dec!(200));
        assert_eq!(account.daily_risk_used(), dec!(0));
        assert_eq!(account.active_trade_count(), 0);
    }

    #[test]
    fn test_reserved_total_tracks_inserts_and_removes() {
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        account.insert_trade(trade("a", dec!(50)));
        account.insert_trade(trade("b", dec!(30)));
        assert_eq!(account.reserved_total(), dec!(80));
        assert_eq!(account.daily_risk_used(), dec!(80));

        account.remove_trade("a");
        assert_eq!(account.reserved_total(), dec!(30));
        // Used budget is not given back by removal alone
        assert_eq!(account.daily_risk_used(), dec!(80));
    }
}
