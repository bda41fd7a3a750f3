//! Alert port
//!
//! Best-effort operator notifications. Delivery failures are logged by
//! the implementation and never surface to the engine.

use async_trait::async_trait;

/// What kind of event an alert describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Signal,
    Fill,
    RiskRejection,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Signal => "signal",
            AlertKind::Fill => "fill",
            AlertKind::RiskRejection => "risk_rejection",
            AlertKind::Error => "error",
        }
    }
}

/// Notification channel to the operator
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver a notification. Implementations swallow their own
    /// failures; the returned future completes regardless.
    async fn notify(&self, kind: AlertKind, payload: serde_json::Value);
}
