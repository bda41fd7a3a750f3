use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time account metrics reported by the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    pub balance: Decimal,
    pub margin: Decimal,
    pub free_margin: Decimal,
}

impl AccountSnapshot {
    /// Snapshot with all margin in use by nothing - convenience for tests
    /// and paper accounts that start flat.
    pub fn flat(equity: Decimal) -> Self {
        Self {
            equity,
            balance: equity,
            margin: Decimal::ZERO,
            free_margin: equity,
        }
    }
}
