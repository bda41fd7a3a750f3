//! In-memory journal for tests

use hermes_ports::{JournalSink, SignalRow, TradeRow, TransitionRow};
use std::sync::Mutex;

/// Collects rows in memory so tests can assert on what was journaled
#[derive(Default)]
pub struct MemoryJournal {
    transitions: Mutex<Vec<TransitionRow>>,
    signals: Mutex<Vec<SignalRow>>,
    trades: Mutex<Vec<TradeRow>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<TransitionRow> {
        self.transitions.lock().expect("journal lock poisoned").clone()
    }

    pub fn signals(&self) -> Vec<SignalRow> {
        self.signals.lock().expect("journal lock poisoned").clone()
    }

    pub fn trades(&self) -> Vec<TradeRow> {
        self.trades.lock().expect("journal lock poisoned").clone()
    }

    /// Transitions recorded for one order, in insertion order
    pub fn transitions_for(&self, order_id: hermes_core::OrderId) -> Vec<TransitionRow> {
        self.transitions()
            .into_iter()
            .filter(|t| t.order_id == order_id)
            .collect()
    }
}

impl JournalSink for MemoryJournal {
    fn record_transition(&self, row: TransitionRow) {
        self.transitions.lock().expect("journal lock poisoned").push(row);
    }

    fn record_signal(&self, row: SignalRow) {
        self.signals.lock().expect("journal lock poisoned").push(row);
    }

    fn record_trade(&self, row: TradeRow) {
        self.trades.lock().expect("journal lock poisoned").push(row);
    }
}
