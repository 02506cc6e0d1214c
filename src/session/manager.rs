//! Session Manager - the authoritative session protocol
//!
//! Coordinates the token codec and the session store. Validity is
//! dual-authority: the signed token is a tamper-evident claim, but the
//! store record is the source of truth. A token that decodes cleanly still
//! verifies against the store, which is what makes server-side revocation
//! possible for an otherwise self-contained artifact.
//!
//! Failure semantics: every session-validity failure (absent, malformed,
//! forged, expired, revoked) collapses to `Ok(None)` so callers treat
//! "logged out" and "tampered token" identically. Only store infrastructure
//! faults propagate as errors.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use chrono::{Duration, Utc};
use thiserror::Error;

use crate::models::{Identity, SessionRecord};
use crate::session::cookie::{extract_session_token, CookieFactory};
use crate::store::{SessionStore, StoreError};
use crate::token::{SessionClaims, TokenCodec};

/// Default session lifetime, from issuance or last renewal
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Upper bound on the configurable lifetime (ten years). Values past this
/// would overflow the duration arithmetic long before they made sense.
pub const MAX_TTL_DAYS: u64 = 3650;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to issue session token")]
    Issue(#[source] anyhow::Error),
}

/// A freshly created or renewed session: the persisted record plus the
/// signed artifact the caller hands to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub record: SessionRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    codec: TokenCodec,
    cookies: CookieFactory,
    ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        secret: &[u8],
        cookie_secure: bool,
        ttl_days: u64,
    ) -> Self {
        let ttl = Duration::days(
            i64::try_from(ttl_days.clamp(1, MAX_TTL_DAYS)).unwrap_or(DEFAULT_TTL_DAYS),
        );
        Self {
            store,
            codec: TokenCodec::new(secret),
            cookies: CookieFactory::new(cookie_secure),
            ttl,
        }
    }

    /// Create a session for `owner_id`: one store write, then a signed token
    /// mirroring the record's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or token signing fails
    pub async fn create(&self, owner_id: &str) -> Result<IssuedSession, SessionError> {
        let expires_at = Utc::now() + self.ttl;
        let record = self.store.create(owner_id, expires_at).await?;

        let claims = SessionClaims::new(&record.id, &record.owner_id, record.expires_at);
        let token = self.codec.encode(&claims).map_err(SessionError::Issue)?;

        log::info!("created session {} for owner {owner_id}", record.id);
        Ok(IssuedSession { record, token })
    }

    /// Verify a presented artifact.
    ///
    /// Decode failures are a normal outcome, logged at debug level and
    /// returned as `None`. On decode success the embedded session id is
    /// cross-checked against the store; a missing or expired record means
    /// `None` even when the token's own claim looked valid.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store is unreachable
    pub async fn verify(&self, token: Option<&str>) -> Result<Option<Identity>, StoreError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("session token rejected: {e}");
                return Ok(None);
            }
        };

        let Some(record) = self.store.find(&claims.sid).await? else {
            log::debug!("session {} not found in store", claims.sid);
            return Ok(None);
        };
        if record.is_expired(Utc::now()) {
            log::debug!("session {} expired in store", record.id);
            // Lazy garbage collection: drop the expired record on contact
            self.store.delete(&record.id).await?;
            return Ok(None);
        }

        Ok(Some(Identity {
            session_id: record.id,
            owner_id: record.owner_id,
        }))
    }

    /// Convenience wrapper: verify the session carried by a request's cookie.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store is unreachable
    pub async fn verify_request(
        &self,
        req: &HttpRequest,
    ) -> Result<Option<Identity>, StoreError> {
        self.verify(extract_session_token(req).as_deref()).await
    }

    /// Sliding-expiration renewal: push the record's expiry to `now + TTL`
    /// and re-issue the artifact with the new expiry. Returns `None` when
    /// the session no longer exists (renewal racing a revoke is harmless).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or token signing fails
    pub async fn renew(&self, session_id: &str) -> Result<Option<IssuedSession>, SessionError> {
        let Some(record) = self.store.find(session_id).await? else {
            return Ok(None);
        };

        let expires_at = Utc::now() + self.ttl;
        self.store.extend(session_id, expires_at).await?;

        let record = SessionRecord {
            expires_at: record.expires_at.max(expires_at),
            ..record
        };
        let claims = SessionClaims::new(&record.id, &record.owner_id, record.expires_at);
        let token = self.codec.encode(&claims).map_err(SessionError::Issue)?;

        log::debug!("renewed session {session_id} until {}", record.expires_at);
        Ok(Some(IssuedSession { record, token }))
    }

    /// Revoke the session the artifact resolves to. The store decides what
    /// the artifact refers to, independent of the token's own judgment.
    /// Idempotent: revoking an expired or already-revoked session succeeds
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store is unreachable
    pub async fn revoke(&self, token: Option<&str>) -> Result<(), StoreError> {
        if let Some(identity) = self.verify(token).await? {
            self.store.delete(&identity.session_id).await?;
            log::info!("revoked session {}", identity.session_id);
        }
        Ok(())
    }

    /// Housekeeping: delete expired records. Verification treats expired
    /// records as absent anyway, so skipping this only costs memory.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store is unreachable
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        self.store.purge_expired(Utc::now()).await
    }

    /// Session cookie carrying the issued artifact.
    #[must_use]
    pub fn session_cookie(&self, issued: &IssuedSession) -> Cookie<'static> {
        self.cookies
            .session_cookie(&issued.token, issued.record.expires_at)
    }

    /// Expired cookie instructing the client to drop its artifact.
    #[must_use]
    pub fn clear_cookie(&self) -> Cookie<'static> {
        self.cookies.clear_cookie()
    }
}
