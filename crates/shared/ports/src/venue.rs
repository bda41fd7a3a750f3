//! Venue gateway port
//!
//! The contract the orchestrator needs from a brokerage connection.
//! Adapters (paper venue, a real broker bridge) implement this trait;
//! the engine never sees past it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes_core::{AccountSnapshot, DealEvent, FillEvent, OrderId, OrderType, Side, SymbolSpec};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a venue adapter
///
/// The transient/permanent split drives the engine's retry policy:
/// transient failures are retried with backoff under the same
/// idempotency key, permanent ones never are.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Transient venue failure: {0}")]
    Transient(String),

    #[error("Permanent venue rejection: {0}")]
    Permanent(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Duplicate submission for idempotency key {key}")]
    Duplicate { key: String },
}

impl VenueError {
    /// Whether a retry with the same idempotency key can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, VenueError::Transient(_))
    }
}

pub type VenueResult<T> = std::result::Result<T, VenueError>;

/// Order submission intent, as handed to the venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub order_id: OrderId,
    /// The trade this order opens or modifies; the venue keys positions
    /// by it so `close_position` can resolve them later
    pub trade_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub lots: Decimal,
    pub price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

impl OrderIntent {
    /// Market order intent
    pub fn market(
        order_id: OrderId,
        trade_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        lots: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Self {
        Self {
            order_id,
            trade_id: trade_id.into(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            lots,
            price: None,
            stop_loss,
            take_profit,
        }
    }

    /// Pending order intent (limit or stop) at a trigger price
    pub fn pending(
        order_id: OrderId,
        trade_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        lots: Decimal,
        price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Self {
        Self {
            order_id,
            trade_id: trade_id.into(),
            symbol: symbol.into(),
            side,
            order_type,
            lots,
            price: Some(price),
            stop_loss,
            take_profit,
        }
    }
}

/// Venue acknowledgment of an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    /// Venue-side reference (ticket) for the accepted order
    pub order_ref: String,
    pub accepted_at: DateTime<Utc>,
}

/// Connection to the execution venue
///
/// Calls may block on network I/O; the engine never holds ledger state
/// across an await on any of these.
#[async_trait]
pub trait VenueGateway: Send + Sync {
    /// Current account metrics (equity, margin)
    async fn account_snapshot(&self) -> VenueResult<AccountSnapshot>;

    /// Contract specification for a symbol
    async fn symbol_info(&self, symbol: &str) -> VenueResult<SymbolSpec>;

    /// Submit an order. The idempotency key lets the venue (or a cache
    /// in front of it) recognize a retried submission as the same
    /// logical order.
    async fn submit_order(&self, intent: &OrderIntent, idempotency_key: &str)
    -> VenueResult<OrderAck>;

    /// Poll for a fill on a working order. None means no fill yet.
    async fn poll_fills(&self, order_id: OrderId) -> VenueResult<Option<FillEvent>>;

    /// Close an open position, fully (lots = None) or partially
    async fn close_position(&self, trade_id: &str, lots: Option<Decimal>)
    -> VenueResult<DealEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_market_intent() {
        let intent = OrderIntent::market(
            Uuid::new_v4(),
            "t-1",
            "EURUSD",
            Side::Buy,
            dec!(0.25),
            Some(dec!(1.0830)),
            None,
        );

        assert_eq!(intent.order_type, OrderType::Market);
        assert!(intent.price.is_none());
        assert_eq!(intent.stop_loss, Some(dec!(1.0830)));
        assert_eq!(intent.trade_id, "t-1");
    }

    #[test]
    fn test_pending_intent_carries_trigger_price() {
        let intent = OrderIntent::pending(
            Uuid::new_v4(),
            "t-2",
            "GBPUSD",
            Side::Sell,
            OrderType::Stop,
            dec!(0.10),
            dec!(1.2500),
            None,
            None,
        );

        assert_eq!(intent.order_type, OrderType::Stop);
        assert_eq!(intent.price, Some(dec!(1.2500)));
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(VenueError::Transient("timeout".to_string()).is_transient());
        assert!(!VenueError::Permanent("bad volume".to_string()).is_transient());
        assert!(!VenueError::UnknownSymbol("XAUUSD".to_string()).is_transient());
        assert!(
            !VenueError::Duplicate {
                key: "k".to_string()
            }
            .is_transient()
        );
    }
}
