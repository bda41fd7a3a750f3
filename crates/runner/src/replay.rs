//! Replay signal source
//!
//! A scripted stand-in for the strategy layer: entry signals configured
//! per polling cycle, emitted once when their cycle comes up. Useful for
//! paper runs and demos; a real deployment plugs its strategy in behind
//! the same `SignalSource` port.

use async_trait::async_trait;
use hermes_core::{EntrySignal, Side, Signal};
use hermes_ports::SignalSource;
use rust_decimal::Decimal;
use serde::Deserialize;

/// One scripted entry
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayEntry {
    /// Polling cycle (0-based) at which the signal fires
    pub cycle: u64,
    pub symbol: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_pips: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub take_profit_pips: Option<Decimal>,
    #[serde(default = "default_tag")]
    pub strategy_tag: String,
}

fn default_tag() -> String {
    "replay".to_string()
}

/// Emits the scripted signals cycle by cycle
pub struct ReplaySignalSource {
    entries: Vec<ReplayEntry>,
    cycle: u64,
}

impl ReplaySignalSource {
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self { entries, cycle: 0 }
    }

    /// Signals left to emit
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl SignalSource for ReplaySignalSource {
    async fn poll(&mut self) -> Vec<Signal> {
        let cycle = self.cycle;
        self.cycle += 1;

        let due: Vec<ReplayEntry> = {
            let (fire, keep): (Vec<_>, Vec<_>) =
                self.entries.drain(..).partition(|e| e.cycle <= cycle);
            self.entries = keep;
            fire
        };

        due.into_iter()
            .map(|entry| {
                let mut signal =
                    EntrySignal::new(entry.symbol, entry.side, entry.stop_pips, entry.strategy_tag);
                if let Some(tp) = entry.take_profit_pips {
                    signal = signal.with_take_profit(tp);
                }
                Signal::Entry(signal)
            })
            .collect()
    }
}
