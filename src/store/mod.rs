//! Persistence seams for session and user records
//!
//! Both stores are traits so the engine behind them stays an external
//! collaborator; the in-memory implementations in [`memory`] are the ones
//! this service ships with. Any key-value or document store that preserves
//! the record shapes and an index on `id` can be slotted in.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewUser, SessionRecord, User};

pub use memory::{MemorySessionStore, MemoryUserStore};

/// Infrastructure fault talking to a store. Deliberately a separate type
/// from any "not found" outcome: an unreachable store is a retryable error,
/// never an authentication signal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of live sessions, independent of token validity.
///
/// Operations are atomic per id; no cross-record transactions. `extend` and
/// `delete` are silent no-ops on missing ids, since renewal or logout racing
/// a revoke is expected and harmless.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session for `owner_id` with a fresh, never-reused id.
    async fn create(
        &self,
        owner_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Move the record's expiry forward. Expiry is monotonically
    /// non-decreasing: an `expires_at` earlier than the stored one is ignored.
    async fn extend(&self, id: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove the record. Idempotent.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Housekeeping sweep: drop records whose expiry has passed. Returns the
    /// number removed. Safe to never call, since verification already treats
    /// expired records as absent.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// User-record collaborator consulted during login, signup, and the
/// current-user lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user and return it with its assigned id.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}
