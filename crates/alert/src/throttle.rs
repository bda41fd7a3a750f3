//! Duplicate-alert suppression
//!
//! Wraps any sink and drops repeats of the same (kind, dedup key) inside
//! a time window. The dedup key is the payload's `"dedup"` field when
//! present, otherwise the whole payload rendered to a string.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hermes_ports::{AlertKind, AlertSink};
use log::debug;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Throttling wrapper around another sink
pub struct Throttled<S> {
    inner: S,
    window: Duration,
    last_sent: Mutex<HashMap<(AlertKind, String), DateTime<Utc>>>,
}

impl<S> Throttled<S> {
    pub fn new(inner: S, window: Duration) -> Self {
        Self {
            inner,
            window,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    fn dedup_key(payload: &serde_json::Value) -> String {
        payload
            .get("dedup")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string())
    }
}

#[async_trait]
impl<S: AlertSink> AlertSink for Throttled<S> {
    async fn notify(&self, kind: AlertKind, payload: serde_json::Value) {
        let key = (kind, Self::dedup_key(&payload));
        let now = Utc::now();

        {
            let mut last_sent = self.last_sent.lock().await;
            if let Some(last) = last_sent.get(&key) {
                if now - *last < self.window {
                    debug!("[ALERT] suppressed duplicate {} alert", kind.as_str());
                    return;
                }
            }
            last_sent.insert(key, now);
        }

        self.inner.notify(kind, payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        delivered: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AlertSink for Counting {
        async fn notify(&self, _kind: AlertKind, _payload: serde_json::Value) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_duplicates_suppressed_inside_window() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let sink = Throttled::new(
            Counting {
                delivered: delivered.clone(),
            },
            Duration::hours(1),
        );

        let payload = json!({"dedup": "daily-budget", "detail": "exhausted"});
        sink.notify(AlertKind::RiskRejection, payload.clone()).await;
        sink.notify(AlertKind::RiskRejection, payload.clone()).await;
        sink.notify(AlertKind::RiskRejection, payload).await;

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_pass() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let sink = Throttled::new(
            Counting {
                delivered: delivered.clone(),
            },
            Duration::hours(1),
        );

        sink.notify(AlertKind::Error, json!({"dedup": "a"})).await;
        sink.notify(AlertKind::Error, json!({"dedup": "b"})).await;
        // Same dedup key but different kind still passes
        sink.notify(AlertKind::RiskRejection, json!({"dedup": "a"})).await;

        assert_eq!(delivered.load(Ordering::SeqCst), 3);
    }
}
