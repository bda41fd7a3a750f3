//! Hermes Gateway
//!
//! Venue adapters behind the [`VenueGateway`](hermes_ports::VenueGateway)
//! port. The engine only ever talks to the port; which adapter sits
//! behind it is a wiring decision.
//!
//! Currently provides [`PaperVenue`], an in-memory venue for paper
//! trading and integration tests: deterministic fills, an idempotency
//! cache in front of order creation, and scriptable failures so retry
//! and rejection paths can be exercised exactly.

pub mod adapters;

pub use adapters::paper::PaperVenue;
