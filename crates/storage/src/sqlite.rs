use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;
use crate::traits::{LocalKey, LocalStore};

pub struct SqliteLocalStore {
    conn: Connection,
}

impl SqliteLocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: LocalKey) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                rusqlite::params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: LocalKey, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO local_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CAST(unixepoch('now','subsec') * 1000 AS INTEGER)",
            rusqlite::params![key.as_str(), value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: LocalKey) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM local_state WHERE key = ?1",
            rusqlite::params![key.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        assert_eq!(store.get(LocalKey::Identity).unwrap(), None);

        store.set(LocalKey::Identity, "peter").unwrap();
        assert_eq!(store.get(LocalKey::Identity).unwrap().as_deref(), Some("peter"));

        store.set(LocalKey::Identity, "anteater").unwrap();
        assert_eq!(store.identity().unwrap().as_deref(), Some("anteater"));

        store.remove(LocalKey::Identity).unwrap();
        assert_eq!(store.identity().unwrap(), None);
        // Removing twice is fine.
        store.remove(LocalKey::Identity).unwrap();
    }

    #[test]
    fn autosave_flag_defaults_off() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        assert!(!store.autosave_enabled().unwrap());
        store.set_autosave_enabled(true).unwrap();
        assert!(store.autosave_enabled().unwrap());
        assert_eq!(
            store.get(LocalKey::AutoSaveEnabled).unwrap().as_deref(),
            Some("true")
        );
        store.set(LocalKey::AutoSaveEnabled, "yes").unwrap();
        assert!(!store.autosave_enabled().unwrap());
    }

    #[test]
    fn empty_identity_counts_as_absent() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        store.set(LocalKey::Identity, "").unwrap();
        assert_eq!(store.identity().unwrap(), None);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        {
            let mut store = SqliteLocalStore::open(&path).unwrap();
            store.set(LocalKey::ActionLog, "[]").unwrap();
            store.set_autosave_enabled(false).unwrap();
        }
        let store = SqliteLocalStore::open(&path).unwrap();
        assert_eq!(store.get(LocalKey::ActionLog).unwrap().as_deref(), Some("[]"));
        assert_eq!(
            store.get(LocalKey::AutoSaveEnabled).unwrap().as_deref(),
            Some("false")
        );
    }
}
