//! Domain library for the user registry.
//!
//! This crate holds the domain types, ports (traits), error definitions and
//! the core services: the storage adapter, the user registry and the session
//! manager. Durable storage engines and the postal-code lookup transport
//! live in adapter crates.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque identifier of a user record, assigned once at registration and
/// never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::EmptyField("id"));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Email address stored in normalized form: trimmed and lower-cased. The
/// normalized value is the registry's uniqueness key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize and wrap an email. Only emptiness is rejected; format
    /// checks are out of scope for this registry.
    pub fn new<S: AsRef<str>>(s: S) -> Result<Self, CoreError> {
        let val = s.as_ref().trim().to_lowercase();
        if val.is_empty() {
            return Err(CoreError::EmptyField("email"));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stored user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Clear text; login compares byte-for-byte.
    pub password: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
}

/// Submitted form payload for registration and edit: every record field
/// except the id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub postal_code: String,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
}

/// Result of a postal-code lookup. Ephemeral: consumed to populate form
/// fields, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
}

/// Key-value store port. Implementations persist string blobs under fixed
/// keys; [`storage::Storage`] owns the JSON encoding on top of this.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Id generator port; deterministic in tests, UUID v4 in production.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> UserId;
}

/// Default id generator backed by UUID v4.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> UserId {
        UserId(uuid::Uuid::new_v4().to_string())
    }
}

/// Failure reported by a [`KeyValueStore`] implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl Error for StoreError {}

/// Core domain errors.
#[derive(Debug, PartialEq, Eq)]
pub enum CoreError {
    DuplicateEmail,
    NotFound,
    InvalidCredentials,
    PasswordMismatch,
    EmptyField(&'static str),
    Store(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::DuplicateEmail => write!(f, "email already in use"),
            CoreError::NotFound => write!(f, "record not found"),
            CoreError::InvalidCredentials => write!(f, "invalid email or password"),
            CoreError::PasswordMismatch => write!(f, "passwords do not match"),
            CoreError::EmptyField(field) => write!(f, "{} must not be empty", field),
            CoreError::Store(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl Error for CoreError {}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::Store(e.0)
    }
}

pub mod adapters;
pub mod registry;
pub mod session;
pub mod storage;
pub mod validate;
