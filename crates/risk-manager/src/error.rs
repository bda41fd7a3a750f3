//! Risk manager errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Trade {trade_id} is already registered")]
    DuplicateTrade { trade_id: String },

    #[error("Trade {trade_id} is not registered")]
    UnknownTrade { trade_id: String },

    #[error("Cannot size position: {reason}")]
    Sizing { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
