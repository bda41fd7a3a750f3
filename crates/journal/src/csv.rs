//! CSV journal files
//!
//! One file per record type, rotated daily by embedding the date in the
//! filename. Appending to a dated file that already exists preserves
//! insertion order; the header is written only when the file is created.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use hermes_ports::{SignalRow, TradeRow, TransitionRow};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TRANSITIONS_HEADER: &str =
    "timestamp,order_id,trade_id,symbol,from_state,to_state,detail";
const SIGNALS_HEADER: &str = "timestamp,symbol,side,kind,detail";
const TRADES_HEADER: &str =
    "opened_at,closed_at,trade_id,symbol,side,lots,realized_pnl";

/// Quote a field when it would break the row
fn field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Daily-rotated CSV journal
pub struct CsvJournal {
    base_dir: PathBuf,
    rotate_daily: bool,
}

impl CsvJournal {
    /// Create the journal, making sure the base directory exists
    pub fn new(base_dir: impl Into<PathBuf>, rotate_daily: bool) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|source| Error::Io {
            path: base_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            base_dir,
            rotate_daily,
        })
    }

    fn file_path(&self, name: &str, at: DateTime<Utc>) -> PathBuf {
        if self.rotate_daily {
            self.base_dir
                .join(format!("{}_{}.csv", name, at.format("%Y-%m-%d")))
        } else {
            self.base_dir.join(format!("{name}.csv"))
        }
    }

    fn append_line(&self, path: &Path, header: &str, line: &str) -> Result<()> {
        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;

        let io_err = |source| Error::Io {
            path: path.display().to_string(),
            source,
        };
        if is_new {
            writeln!(file, "{header}").map_err(io_err)?;
        }
        writeln!(file, "{line}").map_err(io_err)?;
        Ok(())
    }

    pub fn append_transition(&self, row: &TransitionRow) -> Result<()> {
        let path = self.file_path("orders", row.timestamp);
        let line = format!(
            "{},{},{},{},{},{},{}",
            row.timestamp.to_rfc3339(),
            row.order_id,
            field(&row.trade_id),
            field(&row.symbol),
            row.from_state.as_str(),
            row.to_state.as_str(),
            field(&row.detail)
        );
        self.append_line(&path, TRANSITIONS_HEADER, &line)
    }

    pub fn append_signal(&self, row: &SignalRow) -> Result<()> {
        let path = self.file_path("signals", row.timestamp);
        let line = format!(
            "{},{},{},{},{}",
            row.timestamp.to_rfc3339(),
            field(&row.symbol),
            row.side.map(|s| s.as_str()).unwrap_or(""),
            field(&row.kind),
            field(&row.detail)
        );
        self.append_line(&path, SIGNALS_HEADER, &line)
    }

    pub fn append_trade(&self, row: &TradeRow) -> Result<()> {
        let path = self.file_path("trades", row.closed_at);
        let line = format!(
            "{},{},{},{},{},{},{}",
            row.opened_at.to_rfc3339(),
            row.closed_at.to_rfc3339(),
            field(&row.trade_id),
            field(&row.symbol),
            row.side.as_str(),
            row.lots,
            row.realized_pnl
        );
        self.append_line(&path, TRADES_HEADER, &line)
    }
}
