//! Local session cache
//!
//! The cache is a single named slot holding the whole chat list as a JSON
//! array. Every save replaces the slot; there are no partial writes.
//! [`ChatStore`] is total from the reconciler's point of view: failures are
//! logged and surface as an empty list or a skipped write.

use crate::error::{JusticeSyncError, Result};
use crate::session::ChatRecord;
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub use memory::MemoryChatStore;

/// Slot holding the serialized chat list
pub const CHATS_SLOT: &str = "justice_agent_chats";

/// Slot holding the id of the last active user
pub const CURRENT_USER_SLOT: &str = "justice_agent_current_user";

/// Environment variable overriding the cache database path
pub const CACHE_DB_ENV: &str = "JUSTICE_SYNC_CACHE_DB";

/// Durable store for the chat list
///
/// Implementors only need `load_all` and `save_all`; the remaining
/// operations are expressed in terms of those two.
pub trait ChatStore: Send + Sync {
    /// Load every persisted chat, in stored order. Never fails; an unreadable
    /// cache yields an empty list.
    fn load_all(&self) -> Vec<ChatRecord>;

    /// Replace the persisted chat list. Failures are logged, not returned.
    fn save_all(&self, records: &[ChatRecord]);

    /// Find one chat by id
    fn get(&self, id: &str) -> Option<ChatRecord> {
        self.load_all().into_iter().find(|r| r.id == id)
    }

    /// Remove one chat by id
    fn delete(&self, id: &str) {
        let records: Vec<ChatRecord> = self.load_all().into_iter().filter(|r| r.id != id).collect();
        self.save_all(&records);
    }

    /// Replace a chat in place, or insert it at the front
    fn upsert(&self, record: ChatRecord) {
        let mut records = self.load_all();
        match records.iter().position(|r| r.id == record.id) {
            Some(index) => records[index] = record,
            None => records.insert(0, record),
        }
        self.save_all(&records);
    }

    /// Flag a chat as matching the remote state
    fn mark_synced(&self, id: &str) {
        let mut records = self.load_all();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.synced = true;
            self.save_all(&records);
        }
    }

    /// Chats written while the remote service was unreachable
    fn unsynced(&self) -> Vec<ChatRecord> {
        self.load_all().into_iter().filter(|r| !r.synced).collect()
    }
}

/// SQLite-backed cache
///
/// Stores named slots in a single `slots(key, value)` table. The chat list
/// lives in [`CHATS_SLOT`].
pub struct SqliteChatStore {
    db_path: PathBuf,
}

impl SqliteChatStore {
    /// Open the cache in the user's data directory
    ///
    /// Honors the [`CACHE_DB_ENV`] override.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(CACHE_DB_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("br", "justice", "justice-sync").ok_or_else(|| {
            JusticeSyncError::Storage("Could not determine data directory".into())
        })?;

        Self::new_with_path(proj_dirs.data_dir().join("cache.db"))
    }

    /// Open the cache at an explicit path
    ///
    /// # Examples
    ///
    /// ```
    /// use justice_sync::storage::SqliteChatStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteChatStore::new_with_path(dir.path().join("cache.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for cache")
                    .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!(path = %store.db_path.display(), "Opened session cache");
        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open cache database")
            .map_err(|e| JusticeSyncError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
        Ok(())
    }

    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to read slot")
            .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO slots (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .context("Failed to write slot")
        .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM slots WHERE key = ?", params![key])
            .context("Failed to remove slot")
            .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load the chat list, reporting read and parse failures
    pub fn try_load_all(&self) -> Result<Vec<ChatRecord>> {
        match self.read_slot(CHATS_SLOT)? {
            Some(json) => serde_json::from_str(&json)
                .context("Failed to deserialize cached chats")
                .map_err(|e| JusticeSyncError::Storage(e.to_string()).into()),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the chat list, reporting write failures
    pub fn try_save_all(&self, records: &[ChatRecord]) -> Result<()> {
        let json = serde_json::to_string(records)
            .context("Failed to serialize chats")
            .map_err(|e| JusticeSyncError::Storage(e.to_string()))?;
        self.write_slot(CHATS_SLOT, &json)
    }

    /// Remember the last active user
    pub fn save_current_user(&self, user_id: &str) -> Result<()> {
        self.write_slot(CURRENT_USER_SLOT, user_id)
    }

    /// Last active user, if one was saved
    pub fn load_current_user(&self) -> Result<Option<String>> {
        self.read_slot(CURRENT_USER_SLOT)
    }

    /// Drop the chat list and the current user
    pub fn clear_all(&self) -> Result<()> {
        self.remove_slot(CHATS_SLOT)?;
        self.remove_slot(CURRENT_USER_SLOT)?;
        Ok(())
    }
}

impl ChatStore for SqliteChatStore {
    fn load_all(&self) -> Vec<ChatRecord> {
        self.try_load_all().unwrap_or_else(|e| {
            tracing::error!("Error loading chats from cache: {:#}", e);
            Vec::new()
        })
    }

    fn save_all(&self, records: &[ChatRecord]) {
        if let Err(e) = self.try_save_all(records) {
            tracing::error!("Error saving chats to cache: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ChatMessage, ChatSession};
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteChatStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store =
            SqliteChatStore::new_with_path(dir.path().join("cache.db")).expect("open store");
        (store, dir)
    }

    fn record(id: &str, timestamp: i64) -> ChatRecord {
        let mut session = ChatSession::new(id, "Novo Chat", timestamp);
        session.messages.push(ChatMessage::user("Olá", timestamp));
        ChatRecord::from_session(&session, false)
    }

    #[test]
    fn test_init_creates_slots_table() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='slots'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_load_all_on_new_db_is_empty() {
        let (store, _dir) = create_test_store();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_save_all_replaces_previous_contents() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("a", 1), record("b", 2)]);
        store.save_all(&[record("c", 3)]);

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");
    }

    #[test]
    fn test_save_all_preserves_order() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("b", 2), record("a", 1), record("c", 3)]);
        let ids: Vec<String> = store.load_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_corrupt_slot_loads_as_empty() {
        let (store, _dir) = create_test_store();
        store
            .write_slot(CHATS_SLOT, "{not json")
            .expect("write corrupt slot");
        assert!(store.try_load_all().is_err());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_get_and_delete() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("a", 1), record("b", 2)]);

        assert_eq!(store.get("b").map(|r| r.id), Some("b".to_string()));
        store.delete("b");
        assert!(store.get("b").is_none());
        assert!(store.get("a").is_some());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("a", 1)]);
        store.delete("a");
        store.delete("a");
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_upsert_inserts_at_front_and_replaces_in_place() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("a", 1), record("b", 2)]);

        store.upsert(record("c", 3));
        let ids: Vec<String> = store.load_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        let mut updated = record("a", 9);
        updated.title = "Renomeado".to_string();
        store.upsert(updated);
        let loaded = store.load_all();
        assert_eq!(loaded[1].id, "a");
        assert_eq!(loaded[1].title, "Renomeado");
    }

    #[test]
    fn test_mark_synced_and_unsynced() {
        let (store, _dir) = create_test_store();
        store.save_all(&[record("a", 1), record("b", 2)]);
        store.mark_synced("a");

        let unsynced: Vec<String> = store.unsynced().into_iter().map(|r| r.id).collect();
        assert_eq!(unsynced, vec!["b"]);
    }

    #[test]
    fn test_current_user_roundtrip_and_clear() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.load_current_user().unwrap(), None);

        store.save_current_user("user-demo").unwrap();
        store.save_all(&[record("a", 1)]);
        assert_eq!(
            store.load_current_user().unwrap(),
            Some("user-demo".to_string())
        );

        store.clear_all().unwrap();
        assert_eq!(store.load_current_user().unwrap(), None);
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cache.db");
        {
            let store = SqliteChatStore::new_with_path(&path).unwrap();
            store.save_all(&[record("persisted", 1)]);
        }
        let reopened = SqliteChatStore::new_with_path(&path).unwrap();
        assert_eq!(reopened.load_all()[0].id, "persisted");
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("cache.db");
        env::set_var(CACHE_DB_ENV, db_path.to_string_lossy().to_string());

        let store = SqliteChatStore::new().expect("new failed with env override");
        assert_eq!(store.path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var(CACHE_DB_ENV);
    }
}
