//! Session manager: one global "logged in" slot holding a snapshot of the
//! matched record.

use crate::storage::Storage;
use crate::{CoreError, Email, KeyValueStore, StoreError, UserRecord};

pub struct SessionManager<S: KeyValueStore> {
    storage: Storage<S>,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            storage: Storage::new(store),
        }
    }

    /// Validate credentials against the registry and establish the session.
    ///
    /// The stored snapshot is a copy taken now; later edits or deletes of
    /// the underlying record do not propagate to it until the next login.
    /// One generic error covers both unknown email and wrong password.
    pub fn login(&self, email: &str, password: &str) -> Result<UserRecord, CoreError> {
        let email = Email::new(email).map_err(|_| CoreError::InvalidCredentials)?;
        let users = self.storage.load_users();
        let Some(user) = users
            .into_iter()
            .find(|u| u.email == email && u.password == password)
        else {
            return Err(CoreError::InvalidCredentials);
        };
        self.storage.save_session(&user)?;
        Ok(user)
    }

    /// Clear the session slot.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.storage.clear_session()
    }

    /// Session restored at startup, if any.
    pub fn current(&self) -> Option<UserRecord> {
        self.storage.load_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::adapters::SequentialIds;
    use crate::registry::UserRegistry;
    use crate::NewUser;

    fn seeded() -> (UserRegistry<MemoryStore, SequentialIds>, SessionManager<MemoryStore>) {
        let store = MemoryStore::new();
        let registry = UserRegistry::new(store.clone(), SequentialIds::default());
        let session = SessionManager::new(store);
        registry
            .register(NewUser {
                name: "Ana".into(),
                email: "Ana@X.com".into(),
                password: "p1".into(),
                ..NewUser::default()
            })
            .expect("seed user");
        (registry, session)
    }

    #[test]
    fn login_with_exact_credentials_snapshots_session() {
        let (_, session) = seeded();
        let user = session.login("ana@x.com", "p1").expect("logged in");
        assert_eq!(user.name, "Ana");
        assert_eq!(session.current(), Some(user));
    }

    #[test]
    fn login_normalizes_the_email() {
        let (_, session) = seeded();
        assert!(session.login("  ANA@x.com ", "p1").is_ok());
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let (_, session) = seeded();
        let wrong = session.login("ana@x.com", "nope").unwrap_err();
        let unknown = session.login("ghost@x.com", "p1").unwrap_err();
        assert_eq!(wrong, CoreError::InvalidCredentials);
        assert_eq!(unknown, CoreError::InvalidCredentials);
        assert!(session.current().is_none());
    }

    #[test]
    fn logout_clears_the_slot() {
        let (_, session) = seeded();
        session.login("ana@x.com", "p1").unwrap();
        session.logout().unwrap();
        assert!(session.current().is_none());
    }

    #[test]
    fn session_snapshot_is_not_invalidated_by_later_edits() {
        let (registry, session) = seeded();
        let logged_in = session.login("ana@x.com", "p1").unwrap();

        registry
            .update(
                &logged_in.id,
                NewUser {
                    name: "Renamed".into(),
                    email: "ana@x.com".into(),
                    password: "p1".into(),
                    ..NewUser::default()
                },
            )
            .unwrap();

        // The slot still holds the login-time copy.
        assert_eq!(session.current().map(|u| u.name), Some("Ana".into()));
    }
}
