//! Bootstrap wiring
//!
//! Builds the whole paper-trading orchestrator from a [`RunnerConfig`]:
//! paper venue, journal writer task, alert sink, risk manager, trade
//! engine. Returns the runnable [`Orchestrator`] plus an
//! [`OrchestratorHandle`] for shutdown and monitoring.

use crate::config::RunnerConfig;
use crate::error::Result;
use crate::replay::ReplaySignalSource;
use chrono::Duration;
use hermes_alert::{LogNotifier, TelegramNotifier, Throttled};
use hermes_clock::SystemClock;
use hermes_engine::{EngineConfig, RetryPolicy, TradeEngine};
use hermes_gateway::PaperVenue;
use hermes_journal::{CsvJournal, JournalWriter};
use hermes_ports::{AlertSink, Clock, VenueGateway};
use hermes_risk_manager::{
    DrawdownScaled, RiskAccount, RiskConfig, RiskManager, RiskStatus,
};
use log::info;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

/// The wired engine, ready to run
pub struct Orchestrator {
    pub engine: TradeEngine,
    pub shutdown_rx: mpsc::Receiver<()>,
    pub journal_task: JoinHandle<()>,
}

impl Orchestrator {
    /// Run the engine until shutdown, then wait for the journal to drain
    pub async fn run(self) {
        self.engine.run(self.shutdown_rx).await;
        // The engine held the last journal handle; dropping it closes the
        // queue, the writer drains what is left and stops on its own
        let _ = self.journal_task.await;
    }
}

/// Control surface handed to the caller
pub struct OrchestratorHandle {
    pub shutdown: mpsc::Sender<()>,
    pub status: Arc<RwLock<RiskStatus>>,
}

/// Wire everything from config
pub async fn bootstrap(config: &RunnerConfig) -> Result<(Orchestrator, OrchestratorHandle)> {
    // Venue: paper adapter with the configured symbols
    let venue = Arc::new(PaperVenue::new(config.venue.equity));
    for symbol in &config.app.symbols {
        venue.add_symbol(symbol.to_spec()).await;
        info!("[BOOT] registered symbol {}", symbol.name);
    }

    // Journal: background writer over daily CSV files
    let csv = CsvJournal::new(config.journal.path.clone(), config.journal.rotate_daily)?;
    let (writer, journal_handle) = JournalWriter::new(csv);
    let journal_task = tokio::spawn(writer.run());

    // Alerts: telegram when enabled and credentialed, log otherwise;
    // either way behind a throttle so repeats collapse
    let throttle = Duration::seconds(config.telegram.throttle_secs.unwrap_or(60));
    let alerts: Arc<dyn AlertSink> = match telegram_notifier(config) {
        Some(notifier) => {
            info!("[BOOT] telegram alerts enabled");
            Arc::new(Throttled::new(notifier, throttle))
        }
        None => Arc::new(Throttled::new(LogNotifier::new(), throttle)),
    };

    // Risk: policy selected by configuration
    let risk_config = RiskConfig {
        per_trade_pct: config.risk.per_trade_pct,
        per_day_pct: config.risk.per_day_pct,
        max_active_trades: config.risk.max_active_trades,
        min_risk_increment: config.risk.min_risk_increment,
    };
    let risk = if config.risk.dynamic.enabled {
        info!("[BOOT] dynamic risk policy: drawdown-scaled");
        RiskManager::with_policy(
            risk_config.clone(),
            Box::new(DrawdownScaled::new(
                config.risk.per_trade_pct,
                config.risk.dynamic.drawdown_threshold_pct,
                config.risk.dynamic.reduce_factor,
                config.risk.dynamic.window,
            )),
        )
    } else {
        RiskManager::new(risk_config.clone())
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let snapshot = venue.account_snapshot().await?;
    let account = RiskAccount::open(
        snapshot.equity,
        risk_config.per_day_pct,
        risk_config.max_active_trades,
        clock.now(),
    );
    info!(
        "[BOOT] account opened: equity {}, daily budget {}",
        account.equity(),
        account.daily_risk_limit()
    );

    let engine_config = EngineConfig {
        poll_interval_ms: config.app.poll_interval_ms,
        order_timeout_ms: config.venue.order_timeout_ms,
        idempotency_bucket_secs: config.venue.idempotency_bucket_secs,
        day_boundary_offset_minutes: config.venue.day_boundary_offset_minutes,
        retry: RetryPolicy {
            max_attempts: config.venue.max_attempts,
            backoff_base_ms: config.venue.backoff_base_ms,
            backoff_cap_ms: config.venue.backoff_cap_ms,
        },
    };

    let signals = ReplaySignalSource::new(config.replay.clone());
    let engine = TradeEngine::new(
        engine_config,
        risk,
        account,
        venue,
        Box::new(signals),
        Arc::new(journal_handle),
        alerts,
        clock,
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let handle = OrchestratorHandle {
        shutdown: shutdown_tx,
        status: engine.status_handle(),
    };

    Ok((
        Orchestrator {
            engine,
            shutdown_rx,
            journal_task,
        },
        handle,
    ))
}

fn telegram_notifier(config: &RunnerConfig) -> Option<TelegramNotifier> {
    if !config.telegram.enabled {
        return None;
    }
    match (&config.telegram.bot_token, &config.telegram.chat_id) {
        (Some(token), Some(chat_id)) => Some(TelegramNotifier::new(token, chat_id)),
        _ => TelegramNotifier::from_env(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JournalConfig;
    use crate::replay::ReplayEntry;
    use hermes_core::Side;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_config() -> RunnerConfig {
        RunnerConfig {
            journal: JournalConfig {
                path: std::env::temp_dir()
                    .join(format!("hermes-boot-{}", Uuid::new_v4()))
                    .display()
                    .to_string(),
                rotate_daily: false,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_wires_defaults() {
        let config = test_config();
        let (orchestrator, handle) = bootstrap(&config).await.unwrap();

        let status = handle.status.read().await.clone();
        assert_eq!(status.equity, dec!(10000));
        assert_eq!(status.daily_risk_limit, dec!(200));
        assert!(!status.locked);

        orchestrator.journal_task.abort();
        std::fs::remove_dir_all(&config.journal.path).ok();
    }

    #[tokio::test]
    async fn test_bootstrap_runs_replayed_entry() {
        let mut config = test_config();
        config.replay = vec![ReplayEntry {
            cycle: 0,
            symbol: "EURUSD".to_string(),
            side: Side::Buy,
            stop_pips: dec!(20),
            take_profit_pips: None,
            strategy_tag: "replay".to_string(),
        }];

        let (mut orchestrator, handle) = bootstrap(&config).await.unwrap();
        orchestrator.engine.step().await;

        let status = handle.status.read().await.clone();
        assert_eq!(status.active_trades, 1);
        assert_eq!(status.daily_risk_used, dec!(50));

        orchestrator.journal_task.abort();
        std::fs::remove_dir_all(&config.journal.path).ok();
    }
}
