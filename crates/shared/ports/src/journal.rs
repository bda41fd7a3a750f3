//! Journal port
//!
//! Append-only record keeping. The engine emits one row per order state
//! transition, per consumed signal, and per closed trade; rows for one
//! order arrive in transition order and the journal must preserve it.

use chrono::{DateTime, Utc};
use hermes_core::{OrderId, OrderState, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRow {
    pub order_id: OrderId,
    pub trade_id: String,
    pub symbol: String,
    pub from_state: OrderState,
    pub to_state: OrderState,
    pub timestamp: DateTime<Utc>,
    /// Free-form context (fill price, rejection reason, ...)
    pub detail: String,
}

/// One consumed strategy signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRow {
    pub symbol: String,
    pub side: Option<Side>,
    pub kind: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// One completed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub trade_id: String,
    pub symbol: String,
    pub side: Side,
    pub lots: Decimal,
    pub realized_pnl: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

/// Sink for durable records
///
/// Sends are fire-and-forget from the engine's standpoint: a journal
/// failure is the journal's problem to retry, never a reason to stall
/// the order state machine.
pub trait JournalSink: Send + Sync {
    fn record_transition(&self, row: TransitionRow);
    fn record_signal(&self, row: SignalRow);
    fn record_trade(&self, row: TradeRow);
}
