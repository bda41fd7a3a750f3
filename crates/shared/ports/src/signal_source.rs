//! Signal source port
//!
//! The strategy layer's face to the engine: a lazily polled, unordered
//! stream of signals, finite per polling cycle. The engine treats each
//! signal as independent and assumes no ordering across symbols.

use async_trait::async_trait;
use hermes_core::Signal;

#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Signals produced since the previous poll. May be empty.
    async fn poll(&mut self) -> Vec<Signal>;
}
