//! Background journal writer
//!
//! The engine hands rows to a [`JournalHandle`] (cheap, never blocks);
//! the [`JournalWriter`] task drains them into the CSV files. A failed
//! write stalls only the writer: it retries a bounded number of times
//! with a short pause, then drops the row with an error log. The order
//! state machine never waits on the journal.

use crate::csv::CsvJournal;
use hermes_ports::{JournalSink, SignalRow, TradeRow, TransitionRow};
use log::{error, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;

/// How many times a row is attempted before giving up
const MAX_WRITE_ATTEMPTS: u32 = 3;
/// Pause between attempts
const RETRY_PAUSE: Duration = Duration::from_millis(250);

/// A row queued for writing
#[derive(Debug)]
enum JournalEvent {
    Transition(TransitionRow),
    Signal(SignalRow),
    Trade(TradeRow),
}

/// Cloneable sending side, implements the `JournalSink` port
#[derive(Clone)]
pub struct JournalHandle {
    tx: mpsc::UnboundedSender<JournalEvent>,
}

impl JournalSink for JournalHandle {
    fn record_transition(&self, row: TransitionRow) {
        // A closed channel means the writer is gone at shutdown; rows
        // emitted after that are intentionally dropped.
        let _ = self.tx.send(JournalEvent::Transition(row));
    }

    fn record_signal(&self, row: SignalRow) {
        let _ = self.tx.send(JournalEvent::Signal(row));
    }

    fn record_trade(&self, row: TradeRow) {
        let _ = self.tx.send(JournalEvent::Trade(row));
    }
}

/// Owns the files and drains the queue
pub struct JournalWriter {
    journal: CsvJournal,
    rx: mpsc::UnboundedReceiver<JournalEvent>,
}

impl JournalWriter {
    /// Create a writer and its handle
    pub fn new(journal: CsvJournal) -> (Self, JournalHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { journal, rx }, JournalHandle { tx })
    }

    /// Drain rows until every handle is dropped
    pub async fn run(mut self) {
        info!("[JOURNAL] writer started");
        while let Some(event) = self.rx.recv().await {
            self.write_with_retry(event).await;
        }
        info!("[JOURNAL] writer stopped");
    }

    async fn write_with_retry(&self, event: JournalEvent) {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let result = match &event {
                JournalEvent::Transition(row) => self.journal.append_transition(row),
                JournalEvent::Signal(row) => self.journal.append_signal(row),
                JournalEvent::Trade(row) => self.journal.append_trade(row),
            };

            match result {
                Ok(()) => return,
                Err(e) if attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(
                        "[JOURNAL] write attempt {}/{} failed: {}",
                        attempt, MAX_WRITE_ATTEMPTS, e
                    );
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(e) => {
                    error!(
                        "[JOURNAL] dropping row after {} attempts: {} ({:?})",
                        MAX_WRITE_ATTEMPTS, e, event
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hermes_core::OrderState;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("hermes-writer-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_rows_flow_through_writer() {
        let dir = scratch_dir();
        let journal = CsvJournal::new(&dir, false).unwrap();
        let (writer, handle) = JournalWriter::new(journal);
        let task = tokio::spawn(writer.run());

        handle.record_transition(TransitionRow {
            order_id: Uuid::new_v4(),
            trade_id: "t-1".to_string(),
            symbol: "EURUSD".to_string(),
            from_state: OrderState::New,
            to_state: OrderState::Placed,
            timestamp: Utc::now(),
            detail: "ack paper-1".to_string(),
        });

        // Dropping the handle closes the queue and stops the writer
        drop(handle);
        task.await.unwrap();

        let content = std::fs::read_to_string(dir.join("orders.csv")).unwrap();
        assert!(content.contains("ack paper-1"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
