//! User registry: CRUD over the storage adapter with an email-uniqueness
//! invariant.

use crate::storage::Storage;
use crate::validate::require;
use crate::{CoreError, Email, IdGenerator, KeyValueStore, NewUser, UserId, UserRecord};

/// Registry service. Every operation is load-mutate-save against the
/// storage adapter; sequential event handling makes that safe.
pub struct UserRegistry<S: KeyValueStore, I: IdGenerator> {
    storage: Storage<S>,
    ids: I,
}

impl<S: KeyValueStore, I: IdGenerator> UserRegistry<S, I> {
    pub fn new(store: S, ids: I) -> Self {
        Self {
            storage: Storage::new(store),
            ids,
        }
    }

    /// Register a new user under a freshly generated id. Rejects an email
    /// already held by any record, after normalization.
    pub fn register(&self, candidate: NewUser) -> Result<UserRecord, CoreError> {
        let record = build_record(self.ids.next_id(), candidate)?;
        let mut users = self.storage.load_users();
        if users.iter().any(|u| u.email == record.email) {
            return Err(CoreError::DuplicateEmail);
        }
        users.push(record.clone());
        self.storage.save_users(&users)?;
        Ok(record)
    }

    /// Full snapshot of the registry, insertion order.
    pub fn list(&self) -> Vec<UserRecord> {
        self.storage.load_users()
    }

    /// Look up a single record by id.
    pub fn get(&self, id: &UserId) -> Option<UserRecord> {
        self.storage.load_users().into_iter().find(|u| &u.id == id)
    }

    /// Replace every field of an existing record except its id. The
    /// uniqueness check skips the record being updated, so keeping the
    /// current email succeeds.
    pub fn update(&self, id: &UserId, fields: NewUser) -> Result<UserRecord, CoreError> {
        let record = build_record(id.clone(), fields)?;
        let mut users = self.storage.load_users();
        if users.iter().any(|u| u.email == record.email && &u.id != id) {
            return Err(CoreError::DuplicateEmail);
        }
        let Some(slot) = users.iter_mut().find(|u| &u.id == id) else {
            return Err(CoreError::NotFound);
        };
        *slot = record.clone();
        self.storage.save_users(&users)?;
        Ok(record)
    }

    /// Remove a record. A second delete of the same id reports `NotFound`;
    /// callers decide whether that is worth surfacing.
    pub fn delete(&self, id: &UserId) -> Result<(), CoreError> {
        let mut users = self.storage.load_users();
        let before = users.len();
        users.retain(|u| &u.id != id);
        if users.len() == before {
            return Err(CoreError::NotFound);
        }
        self.storage.save_users(&users)?;
        Ok(())
    }
}

fn build_record(id: UserId, fields: NewUser) -> Result<UserRecord, CoreError> {
    require("name", &fields.name)?;
    require("password", &fields.password)?;
    let email = Email::new(&fields.email)?;
    Ok(UserRecord {
        id,
        name: fields.name.trim().to_string(),
        email,
        password: fields.password,
        postal_code: fields.postal_code,
        street: fields.street,
        district: fields.district,
        city: fields.city,
        state_code: fields.state_code.map(|s| s.to_uppercase()),
    })
}
