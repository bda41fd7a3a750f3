//! Engine errors

use hermes_core::OrderState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Illegal order transition {from} -> {to}")]
    IllegalTransition { from: OrderState, to: OrderState },

    #[error(transparent)]
    Risk(#[from] hermes_risk_manager::Error),

    #[error(transparent)]
    Venue(#[from] hermes_ports::VenueError),
}

pub type Result<T> = std::result::Result<T, Error>;
