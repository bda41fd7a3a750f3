//! Log-only alert sink
//!
//! Used in paper mode and tests, where pushing to a chat would be noise.

use async_trait::async_trait;
use hermes_ports::{AlertKind, AlertSink};
use log::{info, warn};

pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for LogNotifier {
    async fn notify(&self, kind: AlertKind, payload: serde_json::Value) {
        match kind {
            AlertKind::RiskRejection | AlertKind::Error => {
                warn!("[ALERT] {}: {}", kind.as_str(), payload);
            }
            AlertKind::Signal | AlertKind::Fill => {
                info!("[ALERT] {}: {}", kind.as_str(), payload);
            }
        }
    }
}
