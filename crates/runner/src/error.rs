//! Runner errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Journal(#[from] hermes_journal::Error),

    #[error(transparent)]
    Venue(#[from] hermes_ports::VenueError),
}

pub type Result<T> = std::result::Result<T, Error>;
