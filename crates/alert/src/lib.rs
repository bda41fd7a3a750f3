//! Hermes Alert
//!
//! Operator notifications behind the [`AlertSink`](hermes_ports::AlertSink)
//! port. Delivery is best-effort by contract: every implementation
//! swallows and logs its own failures, so a dead notification channel
//! can never stall trading.
//!
//! - [`TelegramNotifier`] - pushes messages through the Telegram Bot API
//! - [`LogNotifier`] - writes alerts to the log (paper mode, tests)
//! - [`Throttled`] - wrapper that drops repeats of the same alert inside
//!   a time window, so error storms reach the operator once

pub mod log_sink;
pub mod telegram;
pub mod throttle;

pub use log_sink::LogNotifier;
pub use telegram::TelegramNotifier;
pub use throttle::Throttled;
