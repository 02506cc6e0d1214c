//! In-memory store implementations
//!
//! Backed by `RwLock<HashMap>`; every operation takes the lock for a single
//! short critical section and never across an await point. Ids are UUIDv4,
//! which makes them collision-resistant and never reused across deletions.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{SessionStore, StoreError, UserStore};
use crate::models::{NewUser, SessionRecord, User};

impl StoreError {
    fn poisoned() -> Self {
        StoreError::Unavailable("store lock poisoned".to_string())
    }
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records, expired or not. Test and sweep diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().map_err(|_| StoreError::poisoned())?.len())
    }

    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        owner_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            expires_at,
        };

        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;
        Ok(records.get(id).cloned())
    }

    async fn extend(&self, id: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        if let Some(record) = records.get_mut(id) {
            record.expires_at = record.expires_at.max(expires_at);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        records.remove(id);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }
}

/// In-memory user store, keyed by id with a linear email scan.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        Ok(users.get(id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };

        let mut users = self.users.write().map_err(|_| StoreError::poisoned())?;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
