//! Journal errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Journal I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
