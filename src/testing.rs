//! Testing utilities shared by unit and integration tests
//!
//! Enabled for unit tests automatically; integration tests opt in through
//! the `testing` feature.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::credentials::{hash_password, CredentialVerifier};
use crate::models::{NewUser, SessionRecord, User};
use crate::session::SessionManager;
use crate::store::{MemorySessionStore, MemoryUserStore, SessionStore, StoreError, UserStore};

/// Signing secret used across tests
pub const TEST_SECRET: &[u8] = b"test_session_secret_32_chars_min";

/// Fixture builders for the common test setups.
pub struct TestFixtures;

impl TestFixtures {
    /// A session manager over a fresh in-memory store, plus the store handle
    /// for direct manipulation.
    #[must_use]
    pub fn session_manager() -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), TEST_SECRET, false, 7);
        (manager, store)
    }

    /// A credential verifier over a fresh user store, with one registered
    /// user, returning `(verifier, users, user)`.
    ///
    /// # Panics
    ///
    /// Panics if fixture setup fails
    pub async fn verifier_with_user(
        email: &str,
        password: &str,
    ) -> (CredentialVerifier, Arc<MemoryUserStore>, User) {
        let users = Arc::new(MemoryUserStore::new());
        let user = users
            .insert(NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).expect("hashing fixture password"),
            })
            .await
            .expect("inserting fixture user");
        (CredentialVerifier::new(users.clone()), users, user)
    }
}

/// Session store that fails every operation, for exercising the
/// infrastructure-fault path.
pub struct FailingSessionStore;

impl FailingSessionStore {
    fn unavailable() -> StoreError {
        StoreError::Unavailable("simulated outage".to_string())
    }
}

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn create(
        &self,
        _owner_id: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, StoreError> {
        Err(Self::unavailable())
    }

    async fn find(&self, _id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Err(Self::unavailable())
    }

    async fn extend(&self, _id: &str, _expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        Err(Self::unavailable())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(Self::unavailable())
    }
}

/// User store that fails every operation.
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(FailingSessionStore::unavailable())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(FailingSessionStore::unavailable())
    }

    async fn insert(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(FailingSessionStore::unavailable())
    }
}
