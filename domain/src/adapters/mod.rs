//! In-process adapters that live inside the domain crate for convenience.
//!
//! These back unit tests and the in-memory storage provider. Durable stores
//! live in separate crates.

pub mod memory_store;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{IdGenerator, UserId};

/// Deterministic id generator for tests: "u1", "u2", ...
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> UserId {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        UserId::new(format!("u{n}")).expect("generated id is non-empty")
    }
}
