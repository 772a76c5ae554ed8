//! User persistence.
//!
//! The core only needs two operations: fetch a record by username and insert a
//! new one atomically. `create_user` must report a duplicate username as
//! `StoreError::Conflict` even when the row was written by a concurrent request
//! after the caller's own existence check.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One registered user. Immutable once created.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Hex-encoded 32 random bytes.
    pub salt: String,
    /// Hex-encoded PBKDF2-HMAC-SHA256 output.
    pub hashed_password: String,
}

impl UserRecord {
    #[must_use]
    pub fn new(username: impl Into<String>, salt: String, hashed_password: String) -> Self {
        Self {
            username: username.into(),
            created_at: Utc::now(),
            salt,
            hashed_password,
        }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .field("salt", &"***")
            .field("hashed_password", &"***")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken")]
    Conflict,
    #[error("user store failure")]
    Internal(#[source] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Short backend name reported by `/health`.
    fn backend(&self) -> &'static str;

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert `record` unless its username exists.
    ///
    /// Never retried by callers: a failure may mean the row already exists.
    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_debug_hides_hash_material() {
        let record = UserRecord::new("foo", "ab".repeat(32), "cd".repeat(32));
        let debug = format!("{record:?}");
        assert!(debug.contains("foo"));
        assert!(!debug.contains("abab"));
        assert!(!debug.contains("cdcd"));
    }
}
