//! Paper venue
//!
//! In-memory venue for paper trading and tests. Fills are deterministic:
//! an accepted market order fills after a configurable number of fill
//! polls (zero by default), at the intent price or the scripted fill
//! price. Failures are scripted per upcoming submission so retry paths
//! can be driven precisely.
//!
//! The idempotency cache sits in front of order creation: resubmitting
//! the same key returns the original ack without creating a second
//! order, and a conflicting intent under a known key is refused.

use async_trait::async_trait;
use chrono::Utc;
use hermes_core::{AccountSnapshot, DealEvent, FillEvent, OrderId, SymbolSpec};
use hermes_ports::{OrderAck, OrderIntent, VenueError, VenueGateway, VenueResult};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// A working order inside the paper venue
#[derive(Debug, Clone)]
struct PaperOrder {
    intent: OrderIntent,
    order_ref: String,
    /// Fill polls remaining before the order fills
    polls_until_fill: u32,
    filled: bool,
}

/// An open position keyed by trade id
#[derive(Debug, Clone)]
struct PaperPosition {
    lots: Decimal,
    entry_price: Decimal,
}

#[derive(Debug, Default)]
struct PaperState {
    account: Option<AccountSnapshot>,
    symbols: HashMap<String, SymbolSpec>,
    orders: HashMap<OrderId, PaperOrder>,
    /// idempotency key -> (order id, ack handed out)
    submissions: HashMap<String, (OrderId, OrderAck)>,
    positions: HashMap<String, PaperPosition>,
    /// Errors to fail the next submissions with, in order
    submit_failures: VecDeque<VenueError>,
    /// Scripted realized pnl per trade id, applied on close
    close_pnl: HashMap<String, Decimal>,
    fill_delay_polls: u32,
    fill_price: Option<Decimal>,
    ticket_counter: u64,
    deal_counter: u64,
    submit_attempts: u32,
}

/// In-memory venue implementation
pub struct PaperVenue {
    state: Mutex<PaperState>,
}

impl PaperVenue {
    pub fn new(equity: Decimal) -> Self {
        let state = PaperState {
            account: Some(AccountSnapshot::flat(equity)),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Register a tradable symbol
    pub async fn add_symbol(&self, spec: SymbolSpec) {
        let mut state = self.state.lock().await;
        state.symbols.insert(spec.symbol.clone(), spec);
    }

    /// Script the next `count` submissions to fail with clones of `error`
    pub async fn fail_next_submits(&self, count: usize, error: VenueError) {
        let mut state = self.state.lock().await;
        for _ in 0..count {
            state.submit_failures.push_back(error.clone());
        }
    }

    /// Orders fill only after this many fill polls (default 0: first poll)
    pub async fn set_fill_delay(&self, polls: u32) {
        self.state.lock().await.fill_delay_polls = polls;
    }

    /// Price applied to fills when the intent has none
    pub async fn set_fill_price(&self, price: Decimal) {
        self.state.lock().await.fill_price = Some(price);
    }

    /// Script the realized pnl reported when `trade_id` closes
    pub async fn script_close_pnl(&self, trade_id: &str, pnl: Decimal) {
        self.state
            .lock()
            .await
            .close_pnl
            .insert(trade_id.to_string(), pnl);
    }

    /// Update account equity (e.g. between test phases)
    pub async fn set_equity(&self, equity: Decimal) {
        self.state.lock().await.account = Some(AccountSnapshot::flat(equity));
    }

    /// Total submission attempts seen, including failed ones
    pub async fn submit_attempts(&self) -> u32 {
        self.state.lock().await.submit_attempts
    }

    /// Number of distinct venue orders created
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Number of open positions
    pub async fn position_count(&self) -> usize {
        self.state.lock().await.positions.len()
    }
}

#[async_trait]
impl VenueGateway for PaperVenue {
    async fn account_snapshot(&self) -> VenueResult<AccountSnapshot> {
        let state = self.state.lock().await;
        state
            .account
            .ok_or_else(|| VenueError::Transient("account snapshot unavailable".to_string()))
    }

    async fn symbol_info(&self, symbol: &str) -> VenueResult<SymbolSpec> {
        let state = self.state.lock().await;
        state
            .symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))
    }

    async fn submit_order(
        &self,
        intent: &OrderIntent,
        idempotency_key: &str,
    ) -> VenueResult<OrderAck> {
        let mut state = self.state.lock().await;
        state.submit_attempts += 1;

        if let Some(error) = state.submit_failures.pop_front() {
            warn!("[VENUE] scripted failure for order {}: {}", intent.order_id, error);
            return Err(error);
        }

        // Idempotency cache: a resubmission under a known key returns the
        // original ack; a different order under the same key is refused.
        if let Some((known_order, ack)) = state.submissions.get(idempotency_key) {
            if *known_order == intent.order_id {
                debug!(
                    "[VENUE] replay of key {} for order {}, returning original ack",
                    idempotency_key, intent.order_id
                );
                return Ok(ack.clone());
            }
            return Err(VenueError::Duplicate {
                key: idempotency_key.to_string(),
            });
        }

        if !state.symbols.contains_key(&intent.symbol) {
            return Err(VenueError::UnknownSymbol(intent.symbol.clone()));
        }

        state.ticket_counter += 1;
        let ack = OrderAck {
            order_ref: format!("paper-{}", state.ticket_counter),
            accepted_at: Utc::now(),
        };

        let delay = state.fill_delay_polls;
        state.orders.insert(
            intent.order_id,
            PaperOrder {
                intent: intent.clone(),
                order_ref: ack.order_ref.clone(),
                polls_until_fill: delay,
                filled: false,
            },
        );
        state
            .submissions
            .insert(idempotency_key.to_string(), (intent.order_id, ack.clone()));

        info!(
            "[VENUE] accepted {} {} {} lots as {} (key {})",
            intent.side.as_str(),
            intent.symbol,
            intent.lots,
            ack.order_ref,
            idempotency_key
        );
        Ok(ack)
    }

    async fn poll_fills(&self, order_id: OrderId) -> VenueResult<Option<FillEvent>> {
        let mut state = self.state.lock().await;
        let fill_price = state.fill_price;

        let Some(order) = state.orders.get_mut(&order_id) else {
            return Err(VenueError::Permanent(format!(
                "no such working order: {order_id}"
            )));
        };

        if order.filled {
            return Ok(None);
        }
        if order.polls_until_fill > 0 {
            order.polls_until_fill -= 1;
            return Ok(None);
        }

        order.filled = true;
        let price = order
            .intent
            .price
            .or(fill_price)
            .unwrap_or(dec!(1));
        let fill = FillEvent {
            order_id,
            lots_filled: order.intent.lots,
            price,
            partial: false,
            timestamp: Utc::now(),
        };

        let trade_id = order.intent.trade_id.clone();
        let lots = order.intent.lots;
        let order_ref = order.order_ref.clone();
        state.positions.insert(
            trade_id,
            PaperPosition {
                lots,
                entry_price: price,
            },
        );

        debug!("[VENUE] {} filled {} lots @ {}", order_ref, lots, price);
        Ok(Some(fill))
    }

    async fn close_position(
        &self,
        trade_id: &str,
        lots: Option<Decimal>,
    ) -> VenueResult<DealEvent> {
        let mut state = self.state.lock().await;

        let Some(position) = state.positions.get(trade_id).cloned() else {
            return Err(VenueError::Permanent(format!(
                "no open position for trade {trade_id}"
            )));
        };

        let closed_lots = lots.unwrap_or(position.lots).min(position.lots);
        if closed_lots >= position.lots {
            state.positions.remove(trade_id);
        } else if let Some(p) = state.positions.get_mut(trade_id) {
            p.lots -= closed_lots;
        }

        let pnl = state
            .close_pnl
            .get(trade_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        state.deal_counter += 1;

        let deal = DealEvent {
            deal_id: format!("deal-{}", state.deal_counter),
            trade_id: trade_id.to_string(),
            lots: closed_lots,
            price: position.entry_price,
            realized_pnl: pnl,
            timestamp: Utc::now(),
        };
        info!(
            "[VENUE] closed {} lots of trade {} pnl {}",
            closed_lots, trade_id, pnl
        );
        Ok(deal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::Side;
    use uuid::Uuid;

    fn eurusd() -> SymbolSpec {
        SymbolSpec {
            symbol: "EURUSD".to_string(),
            digits: 5,
            point: dec!(0.00001),
            contract_size: dec!(100000),
            lot_step: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
            pip_value_per_lot: dec!(10),
        }
    }

    async fn venue() -> PaperVenue {
        let venue = PaperVenue::new(dec!(10000));
        venue.add_symbol(eurusd()).await;
        venue
    }

    fn market_intent(trade_id: &str) -> OrderIntent {
        OrderIntent::market(
            Uuid::new_v4(),
            trade_id,
            "EURUSD",
            Side::Buy,
            dec!(0.25),
            Some(dec!(1.0830)),
            None,
        )
    }

    #[tokio::test]
    async fn test_submit_and_fill() {
        let venue = venue().await;
        let intent = market_intent("t-1");

        let ack = venue.submit_order(&intent, "key-1").await.unwrap();
        assert_eq!(ack.order_ref, "paper-1");

        let fill = venue.poll_fills(intent.order_id).await.unwrap().unwrap();
        assert_eq!(fill.lots_filled, dec!(0.25));
        assert!(!fill.partial);

        // A filled order yields no further fills
        assert!(venue.poll_fills(intent.order_id).await.unwrap().is_none());
        assert_eq!(venue.position_count().await, 1);
    }

    #[tokio::test]
    async fn test_fill_delay() {
        let venue = venue().await;
        venue.set_fill_delay(2).await;
        let intent = market_intent("t-1");
        venue.submit_order(&intent, "key-1").await.unwrap();

        assert!(venue.poll_fills(intent.order_id).await.unwrap().is_none());
        assert!(venue.poll_fills(intent.order_id).await.unwrap().is_none());
        assert!(venue.poll_fills(intent.order_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_idempotent_resubmission() {
        let venue = venue().await;
        let intent = market_intent("t-1");

        let first = venue.submit_order(&intent, "key-1").await.unwrap();
        let replay = venue.submit_order(&intent, "key-1").await.unwrap();

        assert_eq!(first.order_ref, replay.order_ref);
        assert_eq!(venue.order_count().await, 1);
        assert_eq!(venue.submit_attempts().await, 2);
    }

    #[tokio::test]
    async fn test_conflicting_intent_under_same_key() {
        let venue = venue().await;
        let intent = market_intent("t-1");
        venue.submit_order(&intent, "key-1").await.unwrap();

        let other = market_intent("t-2");
        let err = venue.submit_order(&other, "key-1").await.unwrap_err();
        assert_eq!(
            err,
            VenueError::Duplicate {
                key: "key-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_scripted_failures_then_success() {
        let venue = venue().await;
        venue
            .fail_next_submits(2, VenueError::Transient("link down".to_string()))
            .await;
        let intent = market_intent("t-1");

        assert!(venue.submit_order(&intent, "k").await.is_err());
        assert!(venue.submit_order(&intent, "k").await.is_err());
        assert!(venue.submit_order(&intent, "k").await.is_ok());
        assert_eq!(venue.submit_attempts().await, 3);
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let venue = venue().await;
        let err = venue.symbol_info("XAUUSD").await.unwrap_err();
        assert_eq!(err, VenueError::UnknownSymbol("XAUUSD".to_string()));
    }

    #[tokio::test]
    async fn test_close_with_scripted_pnl() {
        let venue = venue().await;
        let intent = market_intent("t-1");
        venue.submit_order(&intent, "key-1").await.unwrap();
        venue.poll_fills(intent.order_id).await.unwrap();
        venue.script_close_pnl("t-1", dec!(-42)).await;

        let deal = venue.close_position("t-1", None).await.unwrap();
        assert_eq!(deal.realized_pnl, dec!(-42));
        assert_eq!(deal.lots, dec!(0.25));
        assert_eq!(venue.position_count().await, 0);
    }

    #[tokio::test]
    async fn test_partial_close_keeps_remainder() {
        let venue = venue().await;
        let intent = market_intent("t-1");
        venue.submit_order(&intent, "key-1").await.unwrap();
        venue.poll_fills(intent.order_id).await.unwrap();

        let deal = venue.close_position("t-1", Some(dec!(0.10))).await.unwrap();
        assert_eq!(deal.lots, dec!(0.10));
        assert_eq!(venue.position_count().await, 1);

        let rest = venue.close_position("t-1", None).await.unwrap();
        assert_eq!(rest.lots, dec!(0.15));
        assert_eq!(venue.position_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_unknown_position() {
        let venue = venue().await;
        let err = venue.close_position("ghost", None).await.unwrap_err();
        assert!(matches!(err, VenueError::Permanent(_)));
    }
}
