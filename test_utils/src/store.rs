//! In-memory [`RecordStore`] for relay tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crowd3d::relay::{RecordStore, StoreError};
use crowd3d::DEFAULT_LIST_KEY;

#[derive(Debug, Default)]
struct Records {
    lists: BTreeMap<String, Vec<String>>,
    hashes: BTreeMap<String, BTreeMap<String, String>>,
    down: bool,
}

/// Identifier list and hashes held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    /// Appends `id` to the default identifier list.
    pub fn push_id(&self, id: &str) {
        self.push_id_to(DEFAULT_LIST_KEY, id);
    }

    /// Appends `id` to the list stored under `list_key`.
    pub fn push_id_to(&self, list_key: &str, id: &str) {
        self.lock()
            .lists
            .entry(list_key.to_owned())
            .or_default()
            .push(id.to_owned());
    }

    /// Sets one hash field as its raw string value.
    pub fn set_field(&self, id: &str, field: &str, value: &str) {
        self.lock()
            .hashes
            .entry(id.to_owned())
            .or_default()
            .insert(field.to_owned(), value.to_owned());
    }

    /// Lists `id` and stores its position.
    pub fn put(&self, id: &str, x: &str, y: &str) {
        self.push_id(id);
        self.set_field(id, "x", x);
        self.set_field(id, "y", y);
    }

    /// Makes every read fail while `down` is set.
    pub fn set_down(&self, down: bool) {
        self.lock().down = down;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_up(records: &Records) -> Result<(), StoreError> {
        if records.down {
            return Err(StoreError::Other("store offline".into()));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn list_ids(&self, list_key: &str) -> Result<Vec<String>, StoreError> {
        let records = self.lock();
        Self::check_up(&records)?;
        Ok(records.lists.get(list_key).cloned().unwrap_or_default())
    }

    fn read_fields(&self, id: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let records = self.lock();
        Self::check_up(&records)?;
        Ok(records.hashes.get(id).cloned().unwrap_or_default())
    }
}
