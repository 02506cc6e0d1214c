use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Server-side session record, the authoritative source for session validity.
///
/// The signed token handed to the client mirrors these fields at signing time,
/// but revocation and expiry are always decided against this record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub owner_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the record's expiry has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Authenticated identity produced by a successful session verification.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub session_id: String,
    pub owner_id: String,
}

/// Stored user record. The password hash never leaves the store layer;
/// use [`UserProfile`] for anything client-facing.
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl User {
    /// Client-facing view of the user, without the credential material.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// A user record before the store has assigned an id.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_record_expiry() {
        let now = Utc::now();
        let record = SessionRecord {
            id: "s1".to_string(),
            owner_id: "u1".to_string(),
            expires_at: now + Duration::days(7),
        };

        assert!(!record.is_expired(now));
        assert!(record.is_expired(now + Duration::days(8)));
    }

    #[test]
    fn test_user_profile_omits_password_hash() {
        let user = User {
            id: "u1".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
        };

        let profile = user.profile();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("test@example.com"));
    }
}
