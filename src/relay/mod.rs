//! The data relay: Redis records served as one JSON snapshot over HTTP.
//!
//! Each request lists the active identifiers (`LRANGE key 0 -1`), reads every
//! identifier's hash and converts each value to a number. Values that do not
//! parse become `NaN`, which the snapshot encodes as `null`. Identifiers whose
//! hash is empty are left out.

mod server;
mod store;

pub use server::{RelayResponse, RelayServer};
pub use store::{RecordStore, RedisStore, StoreError};

use log::debug;
use thiserror::Error;

use crate::snapshot::{FieldMap, Snapshot};

/// Failure running the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The listen address could not be bound.
    #[error("cannot listen on {addr}: {reason}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Why binding failed.
        reason: String,
    },
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The snapshot could not be encoded.
    #[error("cannot encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    /// Receiving a request or writing a response failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts one stored value to a number; anything unparsable is `NaN`.
///
/// ```
/// assert_eq!(crowd3d::relay::parse_field(" 12.5 "), 12.5);
/// assert!(crowd3d::relay::parse_field("n/a").is_nan());
/// ```
#[must_use]
pub fn parse_field(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// Reads the whole crowd from `store`.
///
/// # Errors
/// Returns the first [`StoreError`] hit; no partial snapshot is produced.
pub fn build_snapshot<S>(store: &S, list_key: &str) -> Result<Snapshot, StoreError>
where
    S: RecordStore + ?Sized,
{
    let mut snapshot = Snapshot::new();
    for id in store.list_ids(list_key)? {
        let raw = store.read_fields(&id)?;
        if raw.is_empty() {
            debug!("identifier {id} has no record; skipping");
            continue;
        }
        let fields: FieldMap = raw
            .iter()
            .map(|(name, value)| (name.as_str(), parse_field(value)))
            .collect();
        snapshot.insert(id, fields);
    }
    Ok(snapshot)
}
