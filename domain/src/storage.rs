//! Storage adapter: JSON blobs over the key-value store port.
//!
//! Two fixed keys: the full user list and the session snapshot. Reads are
//! fail-soft: a missing, unreadable or corrupt blob degrades to "nothing
//! stored" instead of an error. There is no cache; every read re-parses
//! from the store.

use tracing::warn;

use crate::{KeyValueStore, StoreError, UserRecord};

/// Key holding the serialized user list.
pub const USERS_KEY: &str = "users";
/// Key holding the serialized session snapshot; absent when logged out.
pub const SESSION_KEY: &str = "session";

/// JSON codec over a [`KeyValueStore`].
#[derive(Clone, Debug)]
pub struct Storage<S> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the full user list. Absent or corrupt data yields an empty list.
    pub fn load_users(&self) -> Vec<UserRecord> {
        match self.store.get(USERS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(users) => users,
                Err(err) => {
                    warn!(%err, key = USERS_KEY, "discarding corrupt user list");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, key = USERS_KEY, "store read failed");
                Vec::new()
            }
        }
    }

    /// Serialize and write the user list, replacing prior content wholesale.
    pub fn save_users(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(users)
            .map_err(|e| StoreError(format!("encode user list: {e}")))?;
        self.store.set(USERS_KEY, &raw)
    }

    /// Load the session snapshot, if one is stored and readable.
    pub fn load_session(&self) -> Option<UserRecord> {
        match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(%err, key = SESSION_KEY, "discarding corrupt session");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(%err, key = SESSION_KEY, "store read failed");
                None
            }
        }
    }

    pub fn save_session(&self, user: &UserRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)
            .map_err(|e| StoreError(format!("encode session: {e}")))?;
        self.store.set(SESSION_KEY, &raw)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_KEY)
    }
}
