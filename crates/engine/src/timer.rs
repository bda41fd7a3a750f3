//! Timer queue
//!
//! A min-heap of due times driving everything the engine must do later:
//! order timeouts, submission retries, and the daily boundary. The
//! engine polls it with clock-provided time, which keeps timeout
//! behavior fully testable with a manual clock - no ad hoc sleeping in
//! the decision path.

use chrono::{DateTime, Utc};
use hermes_core::OrderId;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;

/// Something scheduled to happen
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// A placed order has waited long enough without a fill
    OrderTimeout(OrderId),
    /// Re-attempt a submission after backoff
    RetrySubmit(OrderId),
    /// Day boundary: reset daily limits, clear the risk lock
    DailyReset,
}

/// Due-time ordered queue of timer events
#[derive(Debug, Default)]
pub struct TimerQueue {
    queue: PriorityQueue<TimerEvent, Reverse<DateTime<Utc>>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event; rescheduling an identical event moves it
    pub fn schedule(&mut self, event: TimerEvent, due: DateTime<Utc>) {
        // push alone keeps whichever due time sorts first; a reschedule
        // must replace, so drop any existing instance
        self.queue.remove(&event);
        self.queue.push(event, Reverse(due));
    }

    /// Drop a scheduled event (e.g. the timeout of an order that filled)
    pub fn cancel(&mut self, event: &TimerEvent) {
        self.queue.remove(event);
    }

    /// Pop every event due at or before `now`, earliest first
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let mut due = Vec::new();
        while let Some((_, Reverse(at))) = self.queue.peek() {
            if *at > now {
                break;
            }
            if let Some((event, _)) = self.queue.pop() {
                due.push(event);
            }
        }
        due
    }

    /// When the next event is due, if any
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|(_, Reverse(at))| *at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
