use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderState, OrderType, Side};

/// Unique identifier for an order, stable across submission retries
pub type OrderId = Uuid;

/// Opaque identifier linking orders to the trade they belong to.
/// Several orders may map to one trade (open plus partial closes).
pub type TradeId = String;

/// One execution attempt against the venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trade_id: TradeId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub lots: Decimal,
    /// Stop-loss price
    pub stop_loss: Option<Decimal>,
    /// Take-profit price
    pub take_profit: Option<Decimal>,
    pub state: OrderState,
    /// Derived from the trade intent, not wall-clock: retries reuse it
    pub idempotency_key: String,
    /// Number of submission attempts made so far
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with an explicit timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_time(
        trade_id: impl Into<TradeId>,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        lots: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        idempotency_key: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trade_id: trade_id.into(),
            symbol: symbol.into(),
            side,
            order_type,
            lots,
            stop_loss,
            take_profit,
            state: OrderState::New,
            idempotency_key: idempotency_key.into(),
            attempt_count: 0,
            created_at: timestamp,
        }
    }

    /// Create a new order using current system time
    /// Note: the engine prefers `new_with_time` with clock-provided time
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: impl Into<TradeId>,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        lots: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self::new_with_time(
            trade_id,
            symbol,
            side,
            order_type,
            lots,
            stop_loss,
            take_profit,
            idempotency_key,
            Utc::now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_starts_in_new() {
        let order = Order::new(
            "t-1",
            "EURUSD",
            Side::Buy,
            OrderType::Market,
            dec!(0.25),
            Some(dec!(1.0850)),
            None,
            "key-abc",
        );

        assert_eq!(order.state, OrderState::New);
        assert_eq!(order.attempt_count, 0);
        assert_eq!(order.trade_id, "t-1");
        assert_eq!(order.idempotency_key, "key-abc");
    }
}
