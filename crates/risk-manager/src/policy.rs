//! Dynamic risk policies
//!
//! A policy adjusts the per-trade risk percentage from recent results
//! before a position is sized. Policies are capabilities selected by
//! configuration - swapping one in never touches the manager itself.

use crate::account::RiskAccount;
use chrono::{DateTime, Utc};
use hermes_core::Side;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of a completed trade, as fed back into a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub trade_id: String,
    pub symbol: String,
    pub side: Side,
    pub realized_pnl: Decimal,
    pub closed_at: DateTime<Utc>,
}

/// Capability interface: adjust the per-trade risk percentage
pub trait DynamicRiskPolicy: Send + Sync {
    /// The percentage of equity to risk on the next trade, given the
    /// ledger and recent closed-trade history (most recent last)
    fn adjust(&self, account: &RiskAccount, history: &[TradeOutcome]) -> Decimal;

    /// Policy name for logs and status output
    fn name(&self) -> &'static str;
}

/// Always risk the configured fixed percentage
pub struct FixedRisk {
    risk_pct: Decimal,
}

impl FixedRisk {
    pub fn new(risk_pct: Decimal) -> Self {
        Self { risk_pct }
    }
}

impl DynamicRiskPolicy for FixedRisk {
    fn adjust(&self, _account: &RiskAccount, _history: &[TradeOutcome]) -> Decimal {
        self.risk_pct
    }

    fn name(&self) -> &'static str {
        "FixedRisk"
    }
}

/// Cut size after a losing streak
///
/// Looks at the cumulative result of the trailing window of closed
/// trades; once the loss exceeds `drawdown_threshold_pct` of equity, the
/// base percentage is multiplied by `reduce_factor` until results
/// recover.
pub struct DrawdownScaled {
    base_pct: Decimal,
    drawdown_threshold_pct: Decimal,
    reduce_factor: Decimal,
    window: usize,
}

impl DrawdownScaled {
    pub fn new(
        base_pct: Decimal,
        drawdown_threshold_pct: Decimal,
        reduce_factor: Decimal,
        window: usize,
    ) -> Self {
        Self {
            base_pct,
            drawdown_threshold_pct,
            reduce_factor,
            window,
        }
    }

    /// Cumulative pnl over the trailing window (negative = drawdown)
    fn trailing_pnl(&self, history: &[TradeOutcome]) -> Decimal {
        history
            .iter()
            .rev()
            .take(self.window)
            .map(|o| o.realized_pnl)
            .sum()
    }
}

impl DynamicRiskPolicy for DrawdownScaled {
    fn adjust(&self, account: &RiskAccount, history: &[TradeOutcome]) -> Decimal {
        let pnl = self.trailing_pnl(history);
        if pnl >= Decimal::ZERO || account.equity().is_zero() {
            return self.base_pct;
        }

        let drawdown_pct = -pnl / account.equity() * Decimal::ONE_HUNDRED;
        if drawdown_pct > self.drawdown_threshold_pct {
            let reduced = self.base_pct * self.reduce_factor;
            info!(
                "[RISK] drawdown {:.2}% over last {} trades exceeds {:.2}%, risk pct {} -> {}",
                drawdown_pct, self.window, self.drawdown_threshold_pct, self.base_pct, reduced
            );
            reduced
        } else {
            self.base_pct
        }
    }

    fn name(&self) -> &'static str {
        "DrawdownScaled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(pnl: Decimal) -> TradeOutcome {
        TradeOutcome {
            trade_id: "t".to_string(),
            symbol: "EURUSD".to_string(),
            side: Side::Buy,
            realized_pnl: pnl,
            closed_at: Utc::now(),
        }
    }

    fn account() -> RiskAccount {
        RiskAccount::open(dec!(10000), dec!(2.0), 4, Utc::now())
    }

    #[test]
    fn test_fixed_risk_ignores_history() {
        let policy = FixedRisk::new(dec!(0.5));
        let history = vec![outcome(dec!(-500)), outcome(dec!(-500))];
        assert_eq!(policy.adjust(&account(), &history), dec!(0.5));
    }

    #[test]
    fn test_drawdown_scaled_reduces_after_threshold() {
        // 1% threshold on 10000 equity = 100 currency
        let policy = DrawdownScaled::new(dec!(0.5), dec!(1.0), dec!(0.5), 5);

        let mild = vec![outcome(dec!(-40)), outcome(dec!(-30))];
        assert_eq!(policy.adjust(&account(), &mild), dec!(0.5));

        let deep = vec![outcome(dec!(-80)), outcome(dec!(-70))];
        assert_eq!(policy.adjust(&account(), &deep), dec!(0.25));
    }

    #[test]
    fn test_drawdown_window_is_trailing() {
        let policy = DrawdownScaled::new(dec!(0.5), dec!(1.0), dec!(0.5), 2);

        // Old heavy loss outside the window no longer counts
        let history = vec![outcome(dec!(-500)), outcome(dec!(10)), outcome(dec!(10))];
        assert_eq!(policy.adjust(&account(), &history), dec!(0.5));
    }

    #[test]
    fn test_profitable_window_keeps_base() {
        let policy = DrawdownScaled::new(dec!(0.5), dec!(1.0), dec!(0.5), 5);
        let history = vec![outcome(dec!(200)), outcome(dec!(-50))];
        assert_eq!(policy.adjust(&account(), &history), dec!(0.5));
    }
}
