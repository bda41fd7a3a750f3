//! Hermes Risk Manager
//!
//! The decision component between strategy signals and order execution:
//!
//! - **Admission**: may a new trade open at all (active-trade cap, daily
//!   risk budget, stop sanity)
//! - **Sizing**: fixed-fractional position sizing from equity, stop
//!   distance and pip value, normalized to the venue's lot constraints
//! - **Ledger**: per-day risk accounting in a [`RiskAccount`] that only
//!   this crate can mutate
//! - **Dynamic risk**: a pluggable [`DynamicRiskPolicy`] that adjusts the
//!   per-trade percentage from recent results
//!
//! All operations are synchronous and side-effect-free except the
//! explicit ledger mutations. Serialization of callers is the engine's
//! job; this crate assumes a single writer per account.

pub mod account;
pub mod error;
pub mod manager;
pub mod policy;

// Re-export main types
pub use account::{ActiveTrade, RiskAccount};
pub use error::{Error, Result};
pub use manager::{AdmissionReason, Decision, PositionSize, RiskConfig, RiskManager, RiskStatus};
pub use policy::{DrawdownScaled, DynamicRiskPolicy, FixedRisk, TradeOutcome};
