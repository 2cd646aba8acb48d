//! sqlite-store — SQLite implementation of the key-value store port.
//!
//! Purpose
//! - Durable local persistence for the registry without any external
//!   service.
//! - Implements the `KeyValueStore` trait from the `domain` crate; the
//!   storage adapter there owns the JSON encoding, this crate only moves
//!   string blobs in and out of one `kv` table.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.

use std::path::Path;
use std::sync::{Arc, Mutex};

use domain::{KeyValueStore, StoreError};
use rusqlite::{params, Connection};

/// File-backed store. Cheap to clone; clones share one connection, so the
/// registry and the session manager see the same data.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database at the given path and ensure the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Construct from env var `DB_PATH` (defaults to `./data/registry.db`).
    pub fn from_env() -> Result<Self, StoreError> {
        let path = std::env::var("DB_PATH").unwrap_or_else(|_| "./data/registry.db".to_string());
        // Ensure directory exists
        if let Some(dir) = Path::new(&path).parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        Self::new(path)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError(format!("sqlite error: {e}"))
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError("mutex poisoned".into()))?;
        let mut stmt = conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query(params![key]).map_err(map_sqerr)?;
        match rows.next().map_err(map_sqerr)? {
            Some(row) => Ok(Some(row.get(0).map_err(map_sqerr)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError("mutex poisoned".into()))?;
        conn.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(map_sqerr)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError("mutex poisoned".into()))?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(map_sqerr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::storage::Storage;
    use domain::{Email, UserId, UserRecord};

    fn tmp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("t.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn get_set_remove_roundtrip() {
        let (store, _dir) = tmp_store();
        assert_eq!(store.get("users").unwrap(), None);
        store.set("users", "[]").unwrap();
        assert_eq!(store.get("users").unwrap(), Some("[]".into()));
        store.set("users", "[1]").unwrap();
        assert_eq!(store.get("users").unwrap(), Some("[1]".into()));
        store.remove("users").unwrap();
        assert_eq!(store.get("users").unwrap(), None);
    }

    #[test]
    fn remove_of_absent_key_is_a_no_op() {
        let (store, _dir) = tmp_store();
        store.remove("nothing").unwrap();
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.set("k", "v").unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".into()));
    }

    #[test]
    fn backs_the_domain_storage_adapter() {
        let (store, _dir) = tmp_store();
        let storage = Storage::new(store);
        let user = UserRecord {
            id: UserId::new("u1").unwrap(),
            name: "Ana".into(),
            email: Email::new("ana@x.com").unwrap(),
            password: "p1".into(),
            postal_code: "01310-100".into(),
            street: Some("Av. Paulista".into()),
            district: None,
            city: Some("São Paulo".into()),
            state_code: Some("SP".into()),
        };
        storage.save_users(std::slice::from_ref(&user)).unwrap();
        assert_eq!(storage.load_users(), vec![user.clone()]);

        storage.save_session(&user).unwrap();
        assert_eq!(storage.load_session(), Some(user));
        storage.clear_session().unwrap();
        assert_eq!(storage.load_session(), None);
    }
}
