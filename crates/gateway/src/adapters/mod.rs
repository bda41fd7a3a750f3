//! Venue adapter implementations

pub mod paper;
