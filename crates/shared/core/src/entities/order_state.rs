use serde::{Deserialize, Serialize};

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Order has been created but not yet submitted
    New,
    /// Venue accepted the submission
    Placed,
    /// Order has been partially filled
    PartiallyFilled,
    /// Order has been completely filled
    Filled,
    /// Filled position has been closed out
    Closed,
    /// Order was rejected by the venue
    Rejected,
    /// Order timed out with no fill
    Expired,
    /// Order was cancelled
    Cancelled,
}

impl OrderState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Closed
                | OrderState::Rejected
                | OrderState::Expired
                | OrderState::Cancelled
        )
    }

    /// Returns true if the order is still working at the venue
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            OrderState::New | OrderState::Placed | OrderState::PartiallyFilled
        )
    }

    /// Whether `next` is a legal successor of this state.
    ///
    /// The transition table is closed: anything not listed here is a
    /// consistency fault, not a venue quirk.
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        use OrderState::*;
        matches!(
            (self, next),
            (New, Placed)
                | (Placed, Rejected)
                | (Placed, PartiallyFilled)
                | (Placed, Filled)
                | (Placed, Expired)
                | (Placed, Cancelled)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, Cancelled)
                | (Filled, Closed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::New => "NEW",
            OrderState::Placed => "PLACED",
            OrderState::PartiallyFilled => "PARTIALLY_FILLED",
            OrderState::Filled => "FILLED",
            OrderState::Closed => "CLOSED",
            OrderState::Rejected => "REJECTED",
            OrderState::Expired => "EXPIRED",
            OrderState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
