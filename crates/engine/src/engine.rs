//! Trade engine event loop
//!
//! One engine instance per risk account. The engine is the single
//! writer of its [`RiskAccount`]: every admission, reservation and
//! release happens inside this task, so ledger mutation needs no lock.
//! Monitoring reads go through the published [`RiskStatus`] handle,
//! which always holds a consistent snapshot.
//!
//! Venue I/O is split fetch-then-decide-then-commit: snapshots and
//! symbol data are awaited first, the ledger is touched only in the
//! synchronous sections between awaits.

use crate::error::Error;
use crate::idempotency::derive_idempotency_key;
use crate::lifecycle::OrderLifecycle;
use crate::retry::RetryPolicy;
use crate::timer::{TimerEvent, TimerQueue};
use chrono::{DateTime, Days, Duration, TimeZone, Utc};
use hermes_core::{EntrySignal, ExitSignal, FillEvent, Order, OrderId, OrderState, OrderType, Signal, TradeId};
use hermes_ports::{
    AlertKind, AlertSink, Clock, JournalSink, OrderAck, OrderIntent, SignalRow, SignalSource,
    TradeRow, TransitionRow, VenueGateway,
};
use hermes_risk_manager::{
    ActiveTrade, AdmissionReason, RiskAccount, RiskManager, RiskStatus, TradeOutcome,
};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the loop polls signals and fills, in milliseconds
    pub poll_interval_ms: u64,
    /// A placed order unfilled for this long expires
    pub order_timeout_ms: u64,
    /// Width of the idempotency-key timestamp bucket, in seconds
    pub idempotency_bucket_secs: i64,
    /// Venue day boundary as minutes offset from UTC midnight
    pub day_boundary_offset_minutes: i64,
    /// Submission retry policy
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            order_timeout_ms: 30_000,
            idempotency_bucket_secs: 60,
            day_boundary_offset_minutes: 0,
            retry: RetryPolicy::default(),
        }
    }
}

/// Sizing data kept between submission and acknowledgment
#[derive(Debug, Clone)]
struct PendingSubmission {
    intent: OrderIntent,
    risk_amount: Decimal,
    stop_distance_pips: Decimal,
}

/// The orchestration loop
pub struct TradeEngine {
    config: EngineConfig,
    venue: Arc<dyn VenueGateway>,
    journal: Arc<dyn JournalSink>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    signals: Box<dyn SignalSource>,
    risk: RiskManager,
    account: RiskAccount,
    orders: HashMap<OrderId, OrderLifecycle>,
    pending: HashMap<OrderId, PendingSubmission>,
    /// Open trade -> the order that opened it
    open_orders: HashMap<TradeId, OrderId>,
    history: Vec<TradeOutcome>,
    timers: TimerQueue,
    /// Latched by a daily-budget denial; cleared only by the daily reset
    locked: bool,
    status: Arc<RwLock<RiskStatus>>,
}

impl TradeEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        risk: RiskManager,
        account: RiskAccount,
        venue: Arc<dyn VenueGateway>,
        signals: Box<dyn SignalSource>,
        journal: Arc<dyn JournalSink>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let status = Arc::new(RwLock::new(risk.status(&account, false)));
        let mut engine = Self {
            config,
            venue,
            journal,
            alerts,
            clock,
            signals,
            risk,
            account,
            orders: HashMap::new(),
            pending: HashMap::new(),
            open_orders: HashMap::new(),
            history: Vec::new(),
            timers: TimerQueue::new(),
            locked: false,
            status,
        };
        engine.schedule_daily_reset();
        engine
    }

    /// Handle for concurrent monitoring reads
    pub fn status_handle(&self) -> Arc<RwLock<RiskStatus>> {
        Arc::clone(&self.status)
    }

    /// Whether entries are currently locked out by the daily budget
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Closed-trade history fed to the dynamic risk policy
    pub fn history(&self) -> &[TradeOutcome] {
        &self.history
    }

    /// Run until shutdown is signalled
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) {
        info!(
            "[ENGINE] started: poll every {}ms, order timeout {}ms",
            self.config.poll_interval_ms, self.config.order_timeout_ms
        );
        let mut tick = tokio::time::interval(std::time::Duration::from_millis(
            self.config.poll_interval_ms,
        ));

        loop {
            tokio::select! {
                _ = tick.tick() => self.step().await,
                _ = shutdown.recv() => {
                    info!("[ENGINE] shutdown requested");
                    break;
                }
            }
        }

        info!(
            "[ENGINE] stopped with {} open trade(s), {} closed this session",
            self.account.active_trade_count(),
            self.history.len()
        );
    }

    /// One full poll cycle: due timers, new signals, fill polls.
    /// `run` calls this on an interval; tests drive it directly.
    pub async fn step(&mut self) {
        self.process_timers().await;

        let batch = self.signals.poll().await;
        for signal in batch {
            match signal {
                Signal::Entry(entry) => self.handle_entry(entry).await,
                Signal::Exit(exit) => self.handle_exit(exit).await,
            }
        }

        self.poll_working_orders().await;

        // Terminal orders are fully journaled by now; drop them
        self.orders.retain(|_, lc| !lc.state().is_terminal());
        self.publish_status().await;
    }

    // ---- timers ----

    async fn process_timers(&mut self) {
        for event in self.timers.pop_due(self.clock.now()) {
            match event {
                TimerEvent::OrderTimeout(order_id) => self.expire_order(order_id).await,
                TimerEvent::RetrySubmit(order_id) => self.try_submit(order_id).await,
                TimerEvent::DailyReset => self.daily_reset().await,
            }
        }
    }

    fn schedule_daily_reset(&mut self) {
        let due = self.next_day_boundary(self.clock.now());
        debug!("[ENGINE] next daily reset at {}", due);
        self.timers.schedule(TimerEvent::DailyReset, due);
    }

    /// Next venue-timezone midnight, expressed in UTC
    fn next_day_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let offset = Duration::minutes(self.config.day_boundary_offset_minutes);
        let venue_now = now + offset;
        let next_midnight = venue_now
            .date_naive()
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt));
        match next_midnight {
            Some(midnight) => midnight - offset,
            // Unreachable outside the far end of the calendar; fall back
            // to a plain 24h cadence
            None => now + Duration::hours(24),
        }
    }

    async fn daily_reset(&mut self) {
        let equity = match self.venue.account_snapshot().await {
            Ok(snapshot) => snapshot.equity,
            Err(e) => {
                warn!("[ENGINE] daily reset using cached equity, snapshot failed: {e}");
                self.account.equity()
            }
        };

        self.account = self
            .risk
            .reset_daily_limits(&self.account, equity, self.clock.now());
        if self.locked {
            info!("[ENGINE] daily risk lock cleared");
            self.locked = false;
        }
        self.schedule_daily_reset();
        self.publish_status().await;
    }

    // ---- entry path ----

    async fn handle_entry(&mut self, signal: EntrySignal) {
        self.journal.record_signal(SignalRow {
            symbol: signal.symbol.clone(),
            side: Some(signal.side),
            kind: "entry".to_string(),
            detail: format!(
                "stop {} pips, confidence {}, strategy {}",
                signal.stop_distance_pips, signal.confidence, signal.strategy_tag
            ),
            timestamp: signal.timestamp,
        });
        self.alert(
            AlertKind::Signal,
            json!({
                "kind": "entry",
                "symbol": signal.symbol,
                "side": signal.side.as_str(),
                "stop_pips": signal.stop_distance_pips.to_string(),
            }),
        );

        // The daily lock short-circuits before the risk manager sees the
        // signal: once the budget denial latched, nothing gets through
        // until the reset.
        if self.locked {
            debug!(
                "[ENGINE] dropping {} entry, daily risk lock active",
                signal.symbol
            );
            return;
        }

        // Fetch phase: all venue I/O before any ledger decision
        let snapshot = match self.venue.account_snapshot().await {
            Ok(s) => s,
            Err(e) => {
                warn!("[ENGINE] dropping {} entry, no account snapshot: {e}", signal.symbol);
                return;
            }
        };
        let spec = match self.venue.symbol_info(&signal.symbol).await {
            Ok(s) => s,
            Err(e) => {
                error!("[ENGINE] dropping {} entry: {e}", signal.symbol);
                self.alert(
                    AlertKind::Error,
                    json!({"symbol": signal.symbol, "error": e.to_string()}),
                );
                return;
            }
        };

        // Decide phase: synchronous, single writer
        self.risk.update_equity(&mut self.account, snapshot.equity);
        let decision = self
            .risk
            .can_open_trade(&self.account, &spec, signal.stop_distance_pips);
        if !decision.admitted {
            self.on_admission_denied(&signal, decision.reason);
            return;
        }

        let risk_pct = self.risk.effective_risk_pct(&self.account, &self.history);
        let size = match self.risk.compute_position_size(
            &self.account,
            &spec,
            signal.stop_distance_pips,
            risk_pct,
        ) {
            Ok(size) => size,
            Err(e) => {
                // A sizing failure is a denial, not a fault
                warn!("[ENGINE] {} entry not sized: {e}", signal.symbol);
                self.alert(
                    AlertKind::RiskRejection,
                    json!({"symbol": signal.symbol, "reason": e.to_string()}),
                );
                return;
            }
        };

        let key = derive_idempotency_key(
            &signal.symbol,
            signal.side,
            signal.timestamp,
            &signal.strategy_tag,
            self.config.idempotency_bucket_secs,
        );
        // The trade id shares the key's identity: a replayed intent maps
        // to the same trade and cannot double-register
        let trade_id = format!("t-{}", &key[..12]);

        let order = Order::new_with_time(
            trade_id.clone(),
            signal.symbol.clone(),
            signal.side,
            OrderType::Market,
            size.lots,
            None,
            None,
            key,
            self.clock.now(),
        );
        let order_id = order.id;
        let intent = OrderIntent::market(
            order_id,
            trade_id,
            signal.symbol.clone(),
            signal.side,
            size.lots,
            None,
            None,
        );

        info!(
            "[ENGINE] submitting {} {} {} lots (risk {})",
            signal.side.as_str(),
            signal.symbol,
            size.lots,
            size.risk_amount
        );
        self.orders.insert(order_id, OrderLifecycle::new(order));
        self.pending.insert(
            order_id,
            PendingSubmission {
                intent,
                risk_amount: size.risk_amount,
                stop_distance_pips: signal.stop_distance_pips,
            },
        );
        self.try_submit(order_id).await;
    }

    fn on_admission_denied(&mut self, signal: &EntrySignal, reason: AdmissionReason) {
        warn!(
            "[ENGINE] {} entry denied: {}",
            signal.symbol,
            reason.as_str()
        );
        self.alert(
            AlertKind::RiskRejection,
            json!({
                "symbol": signal.symbol,
                "reason": reason.as_str(),
                "dedup": reason.as_str(),
            }),
        );

        if reason == AdmissionReason::DailyRiskExhausted {
            // Latch shut; the lock keeps later signals (and alerts) away
            // until the daily reset, so this escalation fires once a day
            info!("[ENGINE] daily risk budget exhausted, locking entries until reset");
            self.locked = true;
        }
    }

    /// One submission attempt; transient failures reschedule themselves
    /// through the timer queue under the same idempotency key
    async fn try_submit(&mut self, order_id: OrderId) {
        let Some(pending) = self.pending.get(&order_id) else {
            return;
        };
        let intent = pending.intent.clone();

        let Some(lifecycle) = self.orders.get_mut(&order_id) else {
            return;
        };
        if lifecycle.state() != OrderState::New {
            return;
        }
        let attempts = lifecycle.bump_attempt();
        let key = lifecycle.order().idempotency_key.clone();

        match self.venue.submit_order(&intent, &key).await {
            Ok(ack) => self.on_ack(order_id, ack).await,
            Err(e) if self.config.retry.should_retry(attempts, &e) => {
                let delay = self.config.retry.delay_after(attempts);
                warn!(
                    "[ENGINE] submit attempt {}/{} for {} failed ({e}), retrying in {}ms",
                    attempts,
                    self.config.retry.max_attempts,
                    intent.symbol,
                    delay.num_milliseconds()
                );
                self.timers
                    .schedule(TimerEvent::RetrySubmit(order_id), self.clock.now() + delay);
            }
            Err(e) => {
                error!(
                    "[ENGINE] dropping {} order after {} attempt(s): {e}",
                    intent.symbol, attempts
                );
                self.alert(
                    AlertKind::Error,
                    json!({
                        "symbol": intent.symbol,
                        "error": e.to_string(),
                        "attempts": attempts,
                    }),
                );
                self.discard_order(order_id);
            }
        }
    }

    /// Venue accepted the submission: place the order and reserve risk
    async fn on_ack(&mut self, order_id: OrderId, ack: OrderAck) {
        if let Err(e) = self
            .apply_transition(order_id, OrderState::Placed, format!("ack {}", ack.order_ref))
        {
            self.contain_fault(order_id, e);
            return;
        }

        let Some(pending) = self.pending.remove(&order_id) else {
            error!("[ENGINE] ack for order {order_id} without pending submission");
            return;
        };
        let Some(lifecycle) = self.orders.get(&order_id) else {
            return;
        };
        let order = lifecycle.order();
        let trade = ActiveTrade {
            trade_id: order.trade_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            risk_amount: pending.risk_amount,
            lots: order.lots,
            stop_distance_pips: pending.stop_distance_pips,
            opened_at: self.clock.now(),
        };
        let trade_id = trade.trade_id.clone();

        if let Err(e) = self.risk.register_new_trade(&mut self.account, trade) {
            // Same intent placed twice: consistency fault, fatal to this
            // order only
            error!("[ENGINE] {e} - abandoning order {order_id}");
            self.discard_order(order_id);
            return;
        }

        self.open_orders.insert(trade_id, order_id);
        self.timers.schedule(
            TimerEvent::OrderTimeout(order_id),
            self.clock.now() + Duration::milliseconds(self.config.order_timeout_ms as i64),
        );
    }

    // ---- fills ----

    async fn poll_working_orders(&mut self) {
        let working: Vec<OrderId> = self
            .orders
            .iter()
            .filter(|(_, lc)| {
                matches!(
                    lc.state(),
                    OrderState::Placed | OrderState::PartiallyFilled
                )
            })
            .map(|(id, _)| *id)
            .collect();

        for order_id in working {
            match self.venue.poll_fills(order_id).await {
                Ok(Some(fill)) => self.on_fill(order_id, fill),
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    warn!("[ENGINE] fill poll for {order_id} failed: {e}");
                }
                Err(e) => {
                    // Leave the order to its timeout rather than guess
                    error!("[ENGINE] fill poll for {order_id} failed hard: {e}");
                }
            }
        }
    }

    fn on_fill(&mut self, order_id: OrderId, fill: FillEvent) {
        let to = if fill.partial {
            OrderState::PartiallyFilled
        } else {
            OrderState::Filled
        };
        let detail = format!("{} lots @ {}", fill.lots_filled, fill.price);

        if let Err(e) = self.apply_transition(order_id, to, detail) {
            self.contain_fault(order_id, e);
            return;
        }
        if to == OrderState::Filled {
            self.timers.cancel(&TimerEvent::OrderTimeout(order_id));
        }
    }

    // ---- exit path ----

    async fn handle_exit(&mut self, signal: ExitSignal) {
        self.journal.record_signal(SignalRow {
            symbol: signal.symbol.clone(),
            side: None,
            kind: "exit".to_string(),
            detail: format!("trade {}, reason: {}", signal.trade_id, signal.reason),
            timestamp: signal.timestamp,
        });
        self.alert(
            AlertKind::Signal,
            json!({
                "kind": "exit",
                "symbol": signal.symbol,
                "trade_id": signal.trade_id,
                "reason": signal.reason,
            }),
        );

        let Some(active) = self.account.active_trade(&signal.trade_id).cloned() else {
            warn!("[ENGINE] exit for unknown trade {}", signal.trade_id);
            return;
        };

        let deal = match self.venue.close_position(&signal.trade_id, signal.lots).await {
            Ok(deal) => deal,
            Err(e) => {
                error!("[ENGINE] close of trade {} failed: {e}", signal.trade_id);
                self.alert(
                    AlertKind::Error,
                    json!({"trade_id": signal.trade_id, "error": e.to_string()}),
                );
                return;
            }
        };

        if deal.lots < active.lots {
            // Partial close: the position lives on and its reservation
            // stays untouched (conservative)
            info!(
                "[ENGINE] partial close of trade {}: {} of {} lots, pnl {}",
                signal.trade_id, deal.lots, active.lots, deal.realized_pnl
            );
            self.journal.record_trade(TradeRow {
                trade_id: active.trade_id.clone(),
                symbol: active.symbol.clone(),
                side: active.side,
                lots: deal.lots,
                realized_pnl: deal.realized_pnl,
                opened_at: active.opened_at,
                closed_at: deal.timestamp,
            });
            return;
        }

        // Full close: transition the opening order and settle the ledger
        if let Some(order_id) = self.open_orders.remove(&signal.trade_id) {
            self.timers.cancel(&TimerEvent::OrderTimeout(order_id));
            if let Err(e) = self.apply_transition(
                order_id,
                OrderState::Closed,
                format!("deal {} pnl {}", deal.deal_id, deal.realized_pnl),
            ) {
                self.contain_fault(order_id, e);
            }
        }

        match self
            .risk
            .register_close(&mut self.account, &signal.trade_id, deal.realized_pnl)
        {
            Ok(closed) => {
                self.history.push(TradeOutcome {
                    trade_id: closed.trade_id.clone(),
                    symbol: closed.symbol.clone(),
                    side: closed.side,
                    realized_pnl: deal.realized_pnl,
                    closed_at: deal.timestamp,
                });
                self.journal.record_trade(TradeRow {
                    trade_id: closed.trade_id,
                    symbol: closed.symbol,
                    side: closed.side,
                    lots: closed.lots,
                    realized_pnl: deal.realized_pnl,
                    opened_at: closed.opened_at,
                    closed_at: deal.timestamp,
                });
            }
            Err(e) => {
                // Ledger out of step with the venue: contained, loudly
                error!(
                    "[ENGINE] close bookkeeping for trade {} failed: {e}",
                    signal.trade_id
                );
            }
        }
    }

    // ---- timeouts ----

    async fn expire_order(&mut self, order_id: OrderId) {
        let Some(lifecycle) = self.orders.get(&order_id) else {
            return;
        };
        if lifecycle.state() != OrderState::Placed {
            return;
        }
        let trade_id = lifecycle.order().trade_id.clone();

        info!("[ENGINE] order {order_id} expired without a fill");
        if let Err(e) =
            self.apply_transition(order_id, OrderState::Expired, "no fill within timeout")
        {
            self.contain_fault(order_id, e);
            return;
        }

        self.open_orders.remove(&trade_id);
        if let Err(e) = self.risk.release_unfilled(&mut self.account, &trade_id) {
            error!("[ENGINE] releasing expired trade {trade_id} failed: {e}");
        }
    }

    // ---- plumbing ----

    /// Apply a lifecycle transition and emit its side effects: exactly
    /// one journal row and one alert per transition, via the log cursor
    fn apply_transition(
        &mut self,
        order_id: OrderId,
        to: OrderState,
        detail: impl Into<String>,
    ) -> Result<(), Error> {
        let now = self.clock.now();
        let Some(lifecycle) = self.orders.get_mut(&order_id) else {
            return Ok(());
        };
        lifecycle.apply(to, now, detail)?;

        let trade_id = lifecycle.order().trade_id.clone();
        let symbol = lifecycle.order().symbol.clone();
        let records = lifecycle.drain_unjournaled();

        for record in records {
            self.journal.record_transition(TransitionRow {
                order_id,
                trade_id: trade_id.clone(),
                symbol: symbol.clone(),
                from_state: record.from,
                to_state: record.to,
                timestamp: record.at,
                detail: record.detail.clone(),
            });
            self.alert(
                alert_kind_for(record.to),
                json!({
                    "order_id": order_id.to_string(),
                    "symbol": symbol,
                    "from": record.from.as_str(),
                    "to": record.to.as_str(),
                    "detail": record.detail,
                }),
            );
        }
        Ok(())
    }

    /// A consistency fault is fatal to the affected order only: log with
    /// full context, drop the order, keep the loop alive
    fn contain_fault(&mut self, order_id: OrderId, error: Error) {
        let state = self.orders.get(&order_id).map(|lc| lc.state());
        error!("[ENGINE] order {order_id} fault in state {state:?}: {error}");
        self.discard_order(order_id);
    }

    fn discard_order(&mut self, order_id: OrderId) {
        if let Some(lifecycle) = self.orders.remove(&order_id) {
            self.open_orders.remove(&lifecycle.order().trade_id);
        }
        self.pending.remove(&order_id);
        self.timers.cancel(&TimerEvent::OrderTimeout(order_id));
        self.timers.cancel(&TimerEvent::RetrySubmit(order_id));
    }

    /// Fire-and-forget notification; delivery never blocks the loop
    fn alert(&self, kind: AlertKind, payload: serde_json::Value) {
        let alerts = Arc::clone(&self.alerts);
        tokio::spawn(async move {
            alerts.notify(kind, payload).await;
        });
    }

    async fn publish_status(&self) {
        let mut status = self.status.write().await;
        *status = self.risk.status(&self.account, self.locked);
    }
}

/// Which alert channel a transition belongs to
fn alert_kind_for(state: OrderState) -> AlertKind {
    match state {
        OrderState::PartiallyFilled | OrderState::Filled | OrderState::Closed => AlertKind::Fill,
        OrderState::Rejected | OrderState::Expired | OrderState::Cancelled => AlertKind::Error,
        OrderState::New | OrderState::Placed => AlertKind::Signal,
    }
}
