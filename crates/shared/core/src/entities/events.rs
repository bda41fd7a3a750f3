use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderId;

/// Fill reported by the venue for a working order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: OrderId,
    pub lots_filled: Decimal,
    pub price: Decimal,
    /// True when only part of the requested volume filled
    pub partial: bool,
    pub timestamp: DateTime<Utc>,
}

/// Deal reported by the venue when a position is closed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealEvent {
    pub deal_id: String,
    pub trade_id: String,
    pub lots: Decimal,
    pub price: Decimal,
    pub realized_pnl: Decimal,
    pub timestamp: DateTime<Utc>,
}
