//! Access to the key-value store holding the crowd records.

use std::collections::BTreeMap;
use std::sync::Arc;

use redis::Commands;
use thiserror::Error;

/// Failure talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store URL was rejected or no connection could be opened.
    #[error("cannot connect to store: {0}")]
    Connect(#[source] redis::RedisError),
    /// A command failed on an open connection.
    #[error("store command failed: {0}")]
    Command(#[source] redis::RedisError),
    /// Failure reported by a non-Redis store.
    #[error("{0}")]
    Other(String),
}

/// Read-only view of the identifier list and per-identifier hashes.
pub trait RecordStore: Send + Sync {
    /// All identifiers stored in the list under `list_key`, in list order.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the store cannot be read.
    fn list_ids(&self, list_key: &str) -> Result<Vec<String>, StoreError>;

    /// Every field of the hash stored under `id`. A missing hash reads as
    /// empty.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the store cannot be read.
    fn read_fields(&self, id: &str) -> Result<BTreeMap<String, String>, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn list_ids(&self, list_key: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_ids(list_key)
    }

    fn read_fields(&self, id: &str) -> Result<BTreeMap<String, String>, StoreError> {
        (**self).read_fields(id)
    }
}

/// [`RecordStore`] backed by Redis.
///
/// Opens a fresh connection for every call, so the relay keeps starting and
/// answering (with errors) while Redis is down.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Parses `url` (e.g. `redis://127.0.0.1:6379/`). No connection is made.
    ///
    /// # Errors
    /// Returns [`StoreError::Connect`] for a malformed URL.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(StoreError::Connect)?;
        Ok(Self { client })
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        self.client.get_connection().map_err(StoreError::Connect)
    }
}

impl RecordStore for RedisStore {
    fn list_ids(&self, list_key: &str) -> Result<Vec<String>, StoreError> {
        self.connection()?
            .lrange(list_key, 0, -1)
            .map_err(StoreError::Command)
    }

    fn read_fields(&self, id: &str) -> Result<BTreeMap<String, String>, StoreError> {
        self.connection()?.hgetall(id).map_err(StoreError::Command)
    }
}
