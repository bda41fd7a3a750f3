//! Hermes Engine
//!
//! The orchestration core between strategy signals and the venue:
//!
//! - **Order lifecycle**: per-order state machine with an explicit legal
//!   transition table and a timestamped, write-once transition log
//! - **Idempotency**: submission keys derived from trade intent, so a
//!   retried submission is the same logical order, never a duplicate
//! - **Retry policy**: bounded exponential backoff for transient venue
//!   failures; permanent rejections are never retried
//! - **Trade engine**: the single-writer event loop that admits, sizes,
//!   submits, tracks and closes trades, and emits journal/alert side
//!   effects for every decision
//!
//! ## Architecture
//!
//! ```text
//! Signal Source ──► ┌────────────────────────────────────────┐
//!                   │              Trade Engine              │
//!                   │  daily lock ─► admission ─► sizing     │
//!                   │        │                      │        │
//!                   │        ▼                      ▼        │
//!                   │  Risk Manager          Order Lifecycle │
//!                   │  (ledger, single       (transition     │
//!                   │   writer)               table + log)   │
//!                   │        │                      │        │
//!                   │        └──────┬───────────────┘        │
//!                   └───────────────┼────────────────────────┘
//!                                   │ intents / polls
//!                                   ▼
//!                            Venue Gateway
//!
//! Journal + Alerts ◄── one row / one notification per transition
//! ```
//!
//! Venue I/O is awaited outside every ledger mutation: the engine
//! fetches, then decides, then commits, so the risk account is never
//! held across a network round trip.

pub mod engine;
pub mod error;
pub mod idempotency;
pub mod lifecycle;
pub mod retry;
pub mod timer;

// Re-export main types
pub use engine::{EngineConfig, TradeEngine};
pub use error::{Error, Result};
pub use idempotency::derive_idempotency_key;
pub use lifecycle::{OrderLifecycle, TransitionRecord};
pub use retry::RetryPolicy;
pub use timer::{TimerEvent, TimerQueue};
