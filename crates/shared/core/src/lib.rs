//! Hermes Core Domain
//!
//! Pure domain types for the Hermes trade orchestrator.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    AccountSnapshot, DealEvent, EntrySignal, ExitSignal, FillEvent, Order, OrderId, OrderState,
    OrderType, Side, Signal, TradeId,
};
pub use instruments::SymbolSpec;
pub use values::{Lots, Price, Symbol, Timestamp};
