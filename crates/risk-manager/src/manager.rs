//! Admission, sizing and ledger operations
//!
//! [`RiskManager`] is the only writer of a [`RiskAccount`]. Admission and
//! sizing are pure reads; `register_*` and `reset_daily_limits` are the
//! ledger mutations. The engine serializes all calls for one account.

use crate::account::{ActiveTrade, RiskAccount};
use crate::error::{Error, Result};
use crate::policy::{DynamicRiskPolicy, FixedRisk, TradeOutcome};
use chrono::{DateTime, Utc};
use hermes_core::SymbolSpec;
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Risk manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Percent of equity risked per trade (0.5 = half a percent)
    pub per_trade_pct: Decimal,
    /// Percent of equity allowed at risk per day
    pub per_day_pct: Decimal,
    /// Maximum concurrently open trades
    pub max_active_trades: usize,
    /// Smallest reservation still worth admitting, in account currency
    pub min_risk_increment: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            per_trade_pct: dec!(0.5),
            per_day_pct: dec!(2.0),
            max_active_trades: 4,
            min_risk_increment: dec!(0.01),
        }
    }
}

/// Why an admission check passed or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionReason {
    Ok,
    MaxTradesReached,
    DailyRiskExhausted,
    InvalidStop,
}

impl AdmissionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionReason::Ok => "ok",
            AdmissionReason::MaxTradesReached => "max_trades_reached",
            AdmissionReason::DailyRiskExhausted => "daily_risk_exhausted",
            AdmissionReason::InvalidStop => "invalid_stop",
        }
    }
}

/// Admission decision for a proposed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub admitted: bool,
    pub reason: AdmissionReason,
}

impl Decision {
    pub fn admit() -> Self {
        Self {
            admitted: true,
            reason: AdmissionReason::Ok,
        }
    }

    pub fn deny(reason: AdmissionReason) -> Self {
        Self {
            admitted: false,
            reason,
        }
    }
}

/// Sized position for an admitted trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSize {
    /// Venue-normalized volume
    pub lots: Decimal,
    /// Worst-case loss of that volume to the stop - the amount reserved
    pub risk_amount: Decimal,
}

/// Monitoring snapshot of the ledger, safe to publish outside the
/// single-writer task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStatus {
    pub equity: Decimal,
    pub daily_risk_limit: Decimal,
    pub daily_risk_used: Decimal,
    pub remaining: Decimal,
    pub active_trades: usize,
    /// True once the daily budget denial has latched the engine shut
    pub locked: bool,
}

/// The risk decision component
pub struct RiskManager {
    config: RiskConfig,
    policy: Box<dyn DynamicRiskPolicy>,
}

impl RiskManager {
    /// Create a manager with the fixed-fraction default policy
    pub fn new(config: RiskConfig) -> Self {
        let policy = Box::new(FixedRisk::new(config.per_trade_pct));
        Self { config, policy }
    }

    /// Create a manager with a custom dynamic-risk policy
    pub fn with_policy(config: RiskConfig, policy: Box<dyn DynamicRiskPolicy>) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Per-trade percentage after the dynamic policy has seen recent
    /// results
    pub fn effective_risk_pct(&self, account: &RiskAccount, history: &[TradeOutcome]) -> Decimal {
        self.policy.adjust(account, history)
    }

    /// May a new trade open right now?
    ///
    /// Checks, in order: the active-trade cap, the stop/pip sanity of the
    /// proposal, and whether the remaining daily budget still covers a
    /// per-trade reservation.
    pub fn can_open_trade(
        &self,
        account: &RiskAccount,
        spec: &SymbolSpec,
        stop_distance_pips: Decimal,
    ) -> Decision {
        if account.active_trade_count() >= account.max_active_trades() {
            return Decision::deny(AdmissionReason::MaxTradesReached);
        }

        if stop_distance_pips <= Decimal::ZERO || spec.pip_value_per_lot <= Decimal::ZERO {
            return Decision::deny(AdmissionReason::InvalidStop);
        }

        let proposed = (account.equity() * self.config.per_trade_pct / Decimal::ONE_HUNDRED)
            .max(self.config.min_risk_increment);
        if self.remaining_daily_risk(account) < proposed {
            return Decision::deny(AdmissionReason::DailyRiskExhausted);
        }

        Decision::admit()
    }

    /// Fixed-fractional position size for an admitted trade
    ///
    /// `risk_amount = equity * risk_pct`; `loss_per_lot = stop distance *
    /// pip value`; lots are the quotient rounded DOWN to the venue's lot
    /// step so the realized reservation never exceeds the requested risk.
    pub fn compute_position_size(
        &self,
        account: &RiskAccount,
        spec: &SymbolSpec,
        stop_distance_pips: Decimal,
        risk_pct: Decimal,
    ) -> Result<PositionSize> {
        let loss_per_lot = stop_distance_pips * spec.pip_value_per_lot;
        if loss_per_lot <= Decimal::ZERO {
            return Err(Error::Sizing {
                reason: format!(
                    "non-positive loss per lot ({} pips x {} per pip)",
                    stop_distance_pips, spec.pip_value_per_lot
                ),
            });
        }

        let risk_amount = account.equity() * risk_pct / Decimal::ONE_HUNDRED;
        let lots_raw = risk_amount / loss_per_lot;
        let lots = spec.clamp_lots(lots_raw);

        if lots.is_zero() {
            return Err(Error::Sizing {
                reason: format!(
                    "stop too tight or account too small: raw size {} below tradable volume",
                    lots_raw
                ),
            });
        }

        Ok(PositionSize {
            lots,
            risk_amount: spec.loss_for_stop(lots, stop_distance_pips),
        })
    }

    /// Reserve budget for a newly placed trade
    ///
    /// Not idempotent by design: the caller must not register the same
    /// trade twice.
    pub fn register_new_trade(&self, account: &mut RiskAccount, trade: ActiveTrade) -> Result<()> {
        if account.active_trade(&trade.trade_id).is_some() {
            return Err(Error::DuplicateTrade {
                trade_id: trade.trade_id,
            });
        }

        info!(
            "[RISK] reserve {} for trade {} ({} {} lots), daily used {} -> {}",
            trade.risk_amount,
            trade.trade_id,
            trade.symbol,
            trade.lots,
            account.daily_risk_used(),
            account.daily_risk_used() + trade.risk_amount
        );
        account.insert_trade(trade);
        Ok(())
    }

    /// Settle a closed trade against the ledger
    ///
    /// The reservation stays consumed for the rest of the day: profits
    /// do not return headroom. A loss larger than the reservation
    /// (slippage past the stop) consumes the excess as well.
    pub fn register_close(
        &self,
        account: &mut RiskAccount,
        trade_id: &str,
        realized_pnl: Decimal,
    ) -> Result<ActiveTrade> {
        let trade = account
            .remove_trade(trade_id)
            .ok_or_else(|| Error::UnknownTrade {
                trade_id: trade_id.to_string(),
            })?;

        let loss = (-realized_pnl).max(Decimal::ZERO);
        if loss > trade.risk_amount {
            let excess = loss - trade.risk_amount;
            warn!(
                "[RISK] trade {} lost {} beyond its {} reservation, consuming excess",
                trade_id, excess, trade.risk_amount
            );
            account.consume_excess_loss(excess);
        }

        info!(
            "[RISK] closed trade {} pnl {}, remaining daily budget {}",
            trade_id,
            realized_pnl,
            self.remaining_daily_risk(account)
        );
        Ok(trade)
    }

    /// Release the reservation of a trade whose order never filled
    /// (expired, rejected after placement, or cancelled unfilled). The
    /// budget returns to its pre-reservation value.
    pub fn release_unfilled(&self, account: &mut RiskAccount, trade_id: &str) -> Result<ActiveTrade> {
        let trade = account
            .remove_trade(trade_id)
            .ok_or_else(|| Error::UnknownTrade {
                trade_id: trade_id.to_string(),
            })?;

        account.refund(trade.risk_amount);
        info!(
            "[RISK] released unfilled trade {} reservation {}, remaining daily budget {}",
            trade_id,
            trade.risk_amount,
            self.remaining_daily_risk(account)
        );
        Ok(trade)
    }

    /// Daily budget still available, clamped at zero
    pub fn remaining_daily_risk(&self, account: &RiskAccount) -> Decimal {
        (account.daily_risk_limit() - account.daily_risk_used()).max(Decimal::ZERO)
    }

    /// Produce the next day's ledger snapshot
    ///
    /// Open trades carry their reservations across the boundary: the new
    /// `daily_risk_used` baseline is the sum of those reservations, never
    /// zero while trades remain open.
    pub fn reset_daily_limits(
        &self,
        account: &RiskAccount,
        new_equity: Decimal,
        day_started_at: DateTime<Utc>,
    ) -> RiskAccount {
        let mut fresh = RiskAccount::open(
            new_equity,
            self.config.per_day_pct,
            self.config.max_active_trades,
            day_started_at,
        );
        for trade in account.active_trades() {
            fresh.insert_trade(trade.clone());
        }
        info!(
            "[RISK] daily reset: equity {}, limit {}, carried {} open trade(s) reserving {}",
            new_equity,
            fresh.daily_risk_limit(),
            fresh.active_trade_count(),
            fresh.reserved_total()
        );
        fresh
    }

    /// Refresh cached equity from a venue snapshot without touching the
    /// day's limit (the limit is snapshotted only at day start)
    pub fn update_equity(&self, account: &mut RiskAccount, equity: Decimal) {
        account.set_equity(equity);
    }

    /// Monitoring snapshot
    pub fn status(&self, account: &RiskAccount, locked: bool) -> RiskStatus {
        RiskStatus {
            equity: account.equity(),
            daily_risk_limit: account.daily_risk_limit(),
            daily_risk_used: account.daily_risk_used(),
            remaining: self.remaining_daily_risk(account),
            active_trades: account.active_trade_count(),
            locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::Side;

    fn eurusd() -> SymbolSpec {
        SymbolSpec {
            symbol: "EURUSD".to_string(),
            digits: 5,
            point: dec!(0.00001),
            contract_size: dec!(100000),
            lot_step: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
            pip_value_per_lot: dec!(10),
        }
    }

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

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default())
    }

    #[test]
    fn test_admits_within_limits() {
        let rm = manager();
        let account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        let decision = rm.can_open_trade(&account, &eurusd(), dec!(20));

        assert!(decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::Ok);
    }

    #[test]
    fn test_denies_at_max_active_trades() {
        let rm = RiskManager::new(RiskConfig {
            max_active_trades: 1,
            ..Default::default()
        });
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 1, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();

        let decision = rm.can_open_trade(&account, &eurusd(), dec!(20));
        assert!(!decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::MaxTradesReached);
    }

    #[test]
    fn test_denies_invalid_stop() {
        let rm = manager();
        let account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());

        let decision = rm.can_open_trade(&account, &eurusd(), dec!(0));
        assert_eq!(decision.reason, AdmissionReason::InvalidStop);

        let mut broken = eurusd();
        broken.pip_value_per_lot = dec!(0);
        let decision = rm.can_open_trade(&account, &broken, dec!(20));
        assert_eq!(decision.reason, AdmissionReason::InvalidStop);
    }

    #[test]
    fn test_daily_budget_denial_before_trade_cap() {
        // Limit 200, two trades reserving 80 each: the third proposed
        // reservation of 80 no longer fits even though only two of four
        // trade slots are used.
        let rm = RiskManager::new(RiskConfig {
            per_trade_pct: dec!(0.8),
            per_day_pct: dec!(2.0),
            max_active_trades: 4,
            ..Default::default()
        });
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(80))).unwrap();
        rm.register_new_trade(&mut account, trade("t2", dec!(80))).unwrap();

        assert_eq!(rm.remaining_daily_risk(&account), dec!(40));
        let decision = rm.can_open_trade(&account, &eurusd(), dec!(20));
        assert!(!decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::DailyRiskExhausted);
    }

    #[test]
    fn test_position_size_reference_case() {
        // equity 10000, 0.5% per trade, 20 pip stop, 10 per pip per lot
        // -> risk 50, loss per lot 200, 0.25 lots
        let rm = manager();
        let account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());

        let size = rm
            .compute_position_size(&account, &eurusd(), dec!(20), dec!(0.5))
            .unwrap();
        assert_eq!(size.lots, dec!(0.25));
        assert_eq!(size.risk_amount, dec!(50));
    }

    #[test]
    fn test_position_size_monotonic_in_stop_distance() {
        let rm = manager();
        let account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        let spec = eurusd();

        let mut previous = None;
        for stop in [5, 10, 20, 40, 80, 160] {
            let lots = rm
                .compute_position_size(&account, &spec, Decimal::from(stop), dec!(0.5))
                .unwrap()
                .lots;
            if let Some(prev) = previous {
                assert!(lots <= prev, "lots must not grow with a wider stop");
            }
            previous = Some(lots);
        }
    }

    #[test]
    fn test_sizing_fails_when_unsizable() {
        let rm = manager();
        // Account so small that even the minimum lot overshoots the step
        // rounding to zero volume
        let account = RiskAccount::open(dec!(10), dec!(2.0), 4, Utc::now());
        let mut spec = eurusd();
        spec.min_lot = dec!(0.000001);
        spec.lot_step = dec!(0.01);

        let err = rm
            .compute_position_size(&account, &spec, dec!(500), dec!(0.5))
            .unwrap_err();
        assert!(matches!(err, Error::Sizing { .. }));

        // Zero pip value is a sizing error, not a panic
        let mut broken = eurusd();
        broken.pip_value_per_lot = dec!(0);
        let err = rm
            .compute_position_size(&account, &broken, dec!(20), dec!(0.5))
            .unwrap_err();
        assert!(matches!(err, Error::Sizing { .. }));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());

        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();
        let err = rm
            .register_new_trade(&mut account, trade("t1", dec!(50)))
            .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateTrade {
                trade_id: "t1".to_string()
            }
        );
        // The failed second registration must not double-count
        assert_eq!(account.daily_risk_used(), dec!(50));
        assert_eq!(account.active_trade_count(), 1);
    }

    #[test]
    fn test_ledger_invariant_over_mixed_sequence() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());

        rm.register_new_trade(&mut account, trade("a", dec!(50))).unwrap();
        assert!(account.reserved_total() <= account.daily_risk_used());

        rm.register_new_trade(&mut account, trade("b", dec!(70))).unwrap();
        assert!(account.reserved_total() <= account.daily_risk_used());

        rm.register_close(&mut account, "a", dec!(25)).unwrap();
        assert!(account.reserved_total() <= account.daily_risk_used());

        rm.register_close(&mut account, "b", dec!(-90)).unwrap();
        assert!(account.reserved_total() <= account.daily_risk_used());
        assert!(account.daily_risk_used() <= account.daily_risk_limit());
    }

    #[test]
    fn test_close_profit_returns_no_headroom() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();

        rm.register_close(&mut account, "t1", dec!(120)).unwrap();
        // Reservation stays consumed for the day
        assert_eq!(account.daily_risk_used(), dec!(50));
        assert_eq!(rm.remaining_daily_risk(&account), dec!(150));
    }

    #[test]
    fn test_close_loss_within_reservation_consumes_nothing_more() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();

        rm.register_close(&mut account, "t1", dec!(-30)).unwrap();
        assert_eq!(account.daily_risk_used(), dec!(50));
    }

    #[test]
    fn test_close_loss_beyond_reservation_consumes_excess() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();

        // Slipped 30 past the stop
        rm.register_close(&mut account, "t1", dec!(-80)).unwrap();
        assert_eq!(account.daily_risk_used(), dec!(80));
    }

    #[test]
    fn test_close_unknown_trade() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        let err = rm.register_close(&mut account, "ghost", dec!(0)).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownTrade {
                trade_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_release_unfilled_restores_budget() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        let before = rm.remaining_daily_risk(&account);

        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();
        assert_eq!(rm.remaining_daily_risk(&account), before - dec!(50));

        rm.release_unfilled(&mut account, "t1").unwrap();
        assert_eq!(rm.remaining_daily_risk(&account), before);
        assert_eq!(account.active_trade_count(), 0);
    }

    #[test]
    fn test_daily_reset_carries_open_reservations() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("overnight", dec!(50))).unwrap();
        rm.register_new_trade(&mut account, trade("closed", dec!(30))).unwrap();
        rm.register_close(&mut account, "closed", dec!(-10)).unwrap();

        let fresh = rm.reset_daily_limits(&account, dec!(10500), Utc::now());

        // New limit from new equity; baseline is the carried reservation,
        // not zero and not yesterday's consumption
        assert_eq!(fresh.daily_risk_limit(), dec!(210));
        assert_eq!(fresh.daily_risk_used(), dec!(50));
        assert_eq!(fresh.active_trade_count(), 1);
        assert!(fresh.active_trade("overnight").is_some());
    }

    #[test]
    fn test_status_snapshot() {
        let rm = manager();
        let mut account = RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now());
        rm.register_new_trade(&mut account, trade("t1", dec!(50))).unwrap();

        let status = rm.status(&account, true);
        assert_eq!(status.daily_risk_used, dec!(50));
        assert_eq!(status.remaining, dec!(150));
        assert_eq!(status.active_trades, 1);
        assert!(status.locked);
    }
}
