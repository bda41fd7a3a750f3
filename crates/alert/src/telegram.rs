//! Telegram notifications
//!
//! Sends orchestrator events to a Telegram chat via the Bot API.

use async_trait::async_trait;
use hermes_ports::{AlertKind, AlertSink};
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;

/// Telegram notification client
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Create from `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`, if both set
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        Some(Self::new(bot_token, chat_id))
    }

    fn format_text(kind: AlertKind, payload: &serde_json::Value) -> String {
        let prefix = match kind {
            AlertKind::Signal => "Signal",
            AlertKind::Fill => "Fill",
            AlertKind::RiskRejection => "Risk",
            AlertKind::Error => "Error",
        };
        format!("{prefix}: {payload}")
    }

    async fn send(&self, text: String) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let message = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        match self.client.post(&url).json(&message).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("[ALERT] telegram delivery ok");
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!("[ALERT] telegram delivery failed: {status} - {body}");
            }
            Err(e) => {
                error!("[ALERT] telegram request failed: {e}");
            }
        }
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn notify(&self, kind: AlertKind, payload: serde_json::Value) {
        self.send(Self::format_text(kind, &payload)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_text() {
        let text = TelegramNotifier::format_text(
            AlertKind::RiskRejection,
            &json!({"symbol": "EURUSD", "reason": "daily_risk_exhausted"}),
        );
        assert!(text.starts_with("Risk: "));
        assert!(text.contains("daily_risk_exhausted"));
    }
}
