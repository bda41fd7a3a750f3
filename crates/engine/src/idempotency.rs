//! Idempotency key derivation
//!
//! The key is a deterministic function of the trade intent - symbol,
//! side, the signal timestamp rounded down to a bucket, and the strategy
//! tag. Wall-clock never enters it, so a retried submission produces the
//! same key and the venue (or the cache in front of it) recognizes the
//! retry as the same logical order.

use chrono::{DateTime, Utc};
use hermes_core::Side;
use sha2::{Digest, Sha256};

/// Derive the submission key for an entry intent.
///
/// `bucket_secs` controls how long a re-emitted identical signal maps to
/// the same key: within one bucket it is the same logical trade,
/// across buckets it is a new one.
pub fn derive_idempotency_key(
    symbol: &str,
    side: Side,
    signal_time: DateTime<Utc>,
    strategy_tag: &str,
    bucket_secs: i64,
) -> String {
    let bucket = if bucket_secs > 0 {
        signal_time.timestamp().div_euclid(bucket_secs)
    } else {
        signal_time.timestamp()
    };

    let mut hasher = Sha256::new();
    hasher.update(symbol.as_bytes());
    hasher.update(b"|");
    hasher.update(side.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(bucket.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(strategy_tag.as_bytes());
    hex::encode(hasher.finalize())
}
