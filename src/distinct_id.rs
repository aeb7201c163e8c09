use crate::errors::StorageError;
use crate::storage::SharedStorage;
use uuid::Uuid;

pub const DISTINCT_ID_KEY: &str = "distinct_id";

/// Stable anonymous id used to correlate requests and feedback
pub struct DistinctIdProvider {
    storage: SharedStorage,
}

impl DistinctIdProvider {
    pub fn new(storage: SharedStorage) -> Self {
        DistinctIdProvider { storage }
    }

    /// Return the stored id, creating and persisting one on first use.
    ///
    /// A corrupt store reads as empty and gets a new id written over it. Only when
    /// the new id cannot be persisted is the result a fresh `anon-<hex>` value,
    /// which then changes from call to call.
    pub fn get_distinct_id(&self) -> String {
        match self.storage.get_item(DISTINCT_ID_KEY) {
            Ok(Some(existing)) if !existing.trim().is_empty() => {
                return existing.trim().to_string();
            }
            Ok(_) => {}
            Err(StorageError::Corrupt(e)) => {
                log::debug!("Distinct id storage is corrupt, replacing it: {e}");
            }
            Err(e) => {
                log::debug!("Distinct id storage unavailable: {e}");
                return anonymous_id();
            }
        }

        let id = Uuid::new_v4().to_string();
        match self.storage.set_item(DISTINCT_ID_KEY, &id) {
            Ok(()) => id,
            Err(e) => {
                log::debug!("Could not persist distinct id: {e}");
                anonymous_id()
            }
        }
    }
}

fn anonymous_id() -> String {
    format!("anon-{:016x}", rand::random::<u64>())
}
