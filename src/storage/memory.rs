//! In-memory session cache
//!
//! Used by tests and by runs that should not touch the user's data
//! directory. Keeps the serialized slot as JSON so it behaves like the
//! SQLite store, including dropping anything that does not round-trip.

use std::sync::{Mutex, PoisonError};

use super::ChatStore;
use crate::session::ChatRecord;

/// Process-local [`ChatStore`]
///
/// # Examples
///
/// ```
/// use justice_sync::storage::{ChatStore, MemoryChatStore};
///
/// let store = MemoryChatStore::new();
/// assert!(store.load_all().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    slot: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryChatStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: &[ChatRecord]) -> Self {
        let store = Self::new();
        store.save_all(records);
        *store.saves.lock().unwrap_or_else(PoisonError::into_inner) = 0;
        store
    }

    /// Overwrite the raw slot contents, e.g. with corrupt JSON
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.into());
    }

    /// Number of `save_all` calls since creation
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatStore for MemoryChatStore {
    fn load_all(&self) -> Vec<ChatRecord> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_deref() {
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                tracing::error!("Error loading chats from memory cache: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    fn save_all(&self, records: &[ChatRecord]) {
        match serde_json::to_string(records) {
            Ok(json) => {
                *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
                *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            }
            Err(e) => tracing::error!("Error saving chats to memory cache: {}", e),
        }
    }
}
