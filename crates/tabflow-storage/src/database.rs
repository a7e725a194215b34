//! Database connection and key-value operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Read the raw value stored under `key`
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    /// Replace the value stored under `key`
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })?;

        tracing::debug!(key = %key, bytes = value.len(), "Stored value");

        Ok(())
    }

    /// Remove `key`. Returns whether a record existed.
    pub fn remove_value(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    /// Remove every stored record
    pub fn clear(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv", [])?;
            Ok(())
        })?;

        tracing::info!("Cleared local storage");

        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, &raw)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_value_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_value("workflows").unwrap(), None);

        db.set_value("workflows", "{}").unwrap();
        db.set_value("workflows", r#"{"a":[1]}"#).unwrap();
        assert_eq!(
            db.get_value("workflows").unwrap().as_deref(),
            Some(r#"{"a":[1]}"#)
        );

        assert!(db.remove_value("workflows").unwrap());
        assert!(!db.remove_value("workflows").unwrap());
        assert_eq!(db.get_value("workflows").unwrap(), None);
    }

    #[test]
    fn test_json_values_and_clear() {
        let db = Database::open_in_memory().unwrap();

        let mut record = BTreeMap::new();
        record.insert("Research".to_string(), vec![42, 7]);
        db.set_json("workflows", &record).unwrap();
        db.set_value("other", "1").unwrap();

        let loaded: Option<BTreeMap<String, Vec<i32>>> = db.get_json("workflows").unwrap();
        assert_eq!(loaded, Some(record));

        db.clear().unwrap();
        let loaded: Option<BTreeMap<String, Vec<i32>>> = db.get_json("workflows").unwrap();
        assert!(loaded.is_none());
        assert_eq!(db.get_value("other").unwrap(), None);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.set_value("workflows", "not json").unwrap();

        let loaded: Result<Option<BTreeMap<String, Vec<i32>>>> = db.get_json("workflows");
        assert!(matches!(loaded, Err(crate::StorageError::Json(_))));
    }
}
