//! Per-order lifecycle tracking
//!
//! [`OrderLifecycle`] wraps an [`Order`] and enforces the legal
//! transition table on every change. Each applied transition is appended
//! to a timestamped log; the log is the authoritative write-once record
//! for the journal. Deduplication is log-side: a monotonic cursor hands
//! every record to the journal exactly once, so the journal itself never
//! has to deduplicate.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use hermes_core::{Order, OrderState};

/// One applied transition
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    /// Position in this order's log, starting at 0
    pub seq: usize,
    pub from: OrderState,
    pub to: OrderState,
    pub at: DateTime<Utc>,
    /// Context for the journal (ack reference, fill price, pnl, ...)
    pub detail: String,
}

/// An order plus its transition history
#[derive(Debug)]
pub struct OrderLifecycle {
    order: Order,
    log: Vec<TransitionRecord>,
    /// Index of the first record not yet handed to the journal
    journal_cursor: usize,
}

impl OrderLifecycle {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            log: Vec::new(),
            journal_cursor: 0,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn state(&self) -> OrderState {
        self.order.state
    }

    /// Count a submission attempt against this order
    pub fn bump_attempt(&mut self) -> u32 {
        self.order.attempt_count += 1;
        self.order.attempt_count
    }

    /// Apply a transition, or fail without changing anything
    pub fn apply(
        &mut self,
        to: OrderState,
        at: DateTime<Utc>,
        detail: impl Into<String>,
    ) -> Result<()> {
        let from = self.order.state;
        if !from.can_transition_to(to) {
            return Err(Error::IllegalTransition { from, to });
        }

        self.order.state = to;
        self.log.push(TransitionRecord {
            seq: self.log.len(),
            from,
            to,
            at,
            detail: detail.into(),
        });
        Ok(())
    }

    /// Records not yet journaled, advancing the cursor past them.
    /// Calling twice never yields the same record twice.
    pub fn drain_unjournaled(&mut self) -> Vec<TransitionRecord> {
        let drained = self.log[self.journal_cursor..].to_vec();
        self.journal_cursor = self.log.len();
        drained
    }

    /// Full transition history, journaled or not
    pub fn log(&self) -> &[TransitionRecord] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{OrderType, Side};
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            "t-1",
            "EURUSD",
            Side::Buy,
            OrderType::Market,
            dec!(0.25),
            None,
            None,
            "key",
        )
    }

    #[test]
    fn test_full_fill_path_to_closed() {
        let mut lc = OrderLifecycle::new(order());
        lc.apply(OrderState::Placed, Utc::now(), "ack").unwrap();
        lc.apply(OrderState::Filled, Utc::now(), "fill").unwrap();
        lc.apply(OrderState::Closed, Utc::now(), "deal").unwrap();

        assert_eq!(lc.state(), OrderState::Closed);
        assert_eq!(lc.log().len(), 3);
        assert_eq!(lc.log()[0].seq, 0);
        assert_eq!(lc.log()[2].to, OrderState::Closed);
    }

    #[test]
    fn test_partial_fill_path_to_closed() {
        let mut lc = OrderLifecycle::new(order());
        lc.apply(OrderState::Placed, Utc::now(), "").unwrap();
        lc.apply(OrderState::PartiallyFilled, Utc::now(), "").unwrap();
        lc.apply(OrderState::Filled, Utc::now(), "").unwrap();
        lc.apply(OrderState::Closed, Utc::now(), "").unwrap();

        assert_eq!(lc.state(), OrderState::Closed);
    }

    #[test]
    fn test_illegal_transition_changes_nothing() {
        let mut lc = OrderLifecycle::new(order());
        let err = lc.apply(OrderState::Filled, Utc::now(), "").unwrap_err();

        assert!(matches!(
            err,
            Error::IllegalTransition {
                from: OrderState::New,
                to: OrderState::Filled
            }
        ));
        assert_eq!(lc.state(), OrderState::New);
        assert!(lc.log().is_empty());
    }

    #[test]
    fn test_closed_is_only_reachable_through_filled() {
        // Every route that skips Filled must fail
        let mut lc = OrderLifecycle::new(order());
        assert!(lc.apply(OrderState::Closed, Utc::now(), "").is_err());

        lc.apply(OrderState::Placed, Utc::now(), "").unwrap();
        assert!(lc.apply(OrderState::Closed, Utc::now(), "").is_err());

        lc.apply(OrderState::PartiallyFilled, Utc::now(), "").unwrap();
        assert!(lc.apply(OrderState::Closed, Utc::now(), "").is_err());
    }

    #[test]
    fn test_drain_yields_each_record_once() {
        let mut lc = OrderLifecycle::new(order());
        lc.apply(OrderState::Placed, Utc::now(), "a").unwrap();

        let first = lc.drain_unjournaled();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].detail, "a");

        // Nothing new: drain is empty, not a repeat
        assert!(lc.drain_unjournaled().is_empty());

        lc.apply(OrderState::Filled, Utc::now(), "b").unwrap();
        lc.apply(OrderState::Closed, Utc::now(), "c").unwrap();
        let rest = lc.drain_unjournaled();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].detail, "b");
        assert_eq!(rest[1].detail, "c");
        assert!(lc.drain_unjournaled().is_empty());
    }

    #[test]
    fn test_attempt_counter() {
        let mut lc = OrderLifecycle::new(order());
        assert_eq!(lc.bump_attempt(), 1);
        assert_eq!(lc.bump_attempt(), 2);
        assert_eq!(lc.order().attempt_count, 2);
    }
}
