//! Persisted set of track ids the user has already been shown.
//!
//! Stored under [`SHOWN_IDS_KEY`] as a JSON array of strings, oldest first. Reads
//! never fail and writes are best effort: losing the ledger only means repeats may
//! come back, so storage problems are logged and otherwise ignored.

use crate::storage::SharedStorage;
use std::collections::HashSet;

pub const SHOWN_IDS_KEY: &str = "already_shown_ids";
pub const DEFAULT_SHOWN_CAP: usize = 300;

pub struct ShownIdLedger {
    storage: SharedStorage,
}

impl ShownIdLedger {
    pub fn new(storage: SharedStorage) -> Self {
        ShownIdLedger { storage }
    }

    /// Current ids with the default cap
    pub fn read(&self) -> Vec<String> {
        self.read_with_cap(DEFAULT_SHOWN_CAP)
    }

    /// The most recent `max` ids, oldest first.
    ///
    /// Absent, corrupt or non-list storage reads as empty. Entries that are not
    /// strings or are blank after trimming are skipped.
    pub fn read_with_cap(&self, max: usize) -> Vec<String> {
        let raw = match self.storage.get_item(SHOWN_IDS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::debug!("Could not read shown ids: {e}");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(entries)) => entries,
            Ok(_) => {
                log::debug!("Shown ids entry is not a list; ignoring it");
                return Vec::new();
            }
            Err(e) => {
                log::debug!("Shown ids entry is not valid JSON: {e}");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let ids: Vec<String> = entries
            .iter()
            .filter_map(|entry| entry.as_str())
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        keep_tail(ids, max)
    }

    /// Merge ids with the default cap
    pub fn add(&self, ids: &[String]) {
        self.add_with_cap(ids, DEFAULT_SHOWN_CAP)
    }

    /// Merge `ids` as a set and keep the newest `max` entries.
    ///
    /// Ids already present keep their original position. Nothing is written when no
    /// new id is added, so an empty merge never touches storage.
    pub fn add_with_cap(&self, ids: &[String], max: usize) {
        let mut merged = self.read_with_cap(max);
        let mut present: HashSet<String> = merged.iter().cloned().collect();

        let before = merged.len();
        for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            if present.insert(id.to_string()) {
                merged.push(id.to_string());
            }
        }
        if merged.len() == before {
            return;
        }

        let merged = keep_tail(merged, max);
        let encoded = match serde_json::to_string(&merged) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::warn!("Could not encode shown ids: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(SHOWN_IDS_KEY, &encoded) {
            log::debug!("Could not persist shown ids: {e}");
        }
    }
}

fn keep_tail(mut ids: Vec<String>, max: usize) -> Vec<String> {
    if ids.len() > max {
        ids.drain(..ids.len() - max);
    }
    ids
}
