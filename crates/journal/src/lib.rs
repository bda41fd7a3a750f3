//! Hermes Journal
//!
//! Durable, append-only record keeping behind the
//! [`JournalSink`](hermes_ports::JournalSink) port:
//!
//! - [`CsvJournal`] - one CSV file per record type per day
//!   (`orders_2024-03-01.csv`, ...), header written on creation, rows
//!   appended in arrival order
//! - [`JournalWriter`] - background task between the engine and the
//!   files; sends from the engine never block, write failures are
//!   retried by the writer and dropped (loudly) after a bounded number
//!   of attempts
//! - [`MemoryJournal`] - in-memory sink for test assertions

pub mod csv;
pub mod error;
pub mod memory;
pub mod writer;

pub use csv::CsvJournal;
pub use error::{Error, Result};
pub use memory::MemoryJournal;
pub use writer::{JournalHandle, JournalWriter};
