//! Credential verification: login and signup against the user store
//!
//! Passwords are hashed with Argon2id and verified with the same slow,
//! salted comparison. Login failures are deliberately uniform: the caller
//! cannot tell an unknown email from a wrong password, which prevents
//! user enumeration.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::{NewUser, User};
use crate::store::{StoreError, UserStore};

/// Uniform rejection message for any failed login check
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials.";

const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // One non-space local part, an @, and a dotted domain. Deliverability
    // is the mail system's problem, not a login-form concern.
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
});

/// Per-field validation errors, returned as-is to populate a form.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub password: Vec<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.password.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level validation failures, returned per-field
    #[error("invalid form fields")]
    Validation(FieldErrors),

    /// Uniform rejection: unknown email and wrong password are identical
    #[error("{INVALID_CREDENTIALS}")]
    InvalidCredentials,

    #[error("Email already exists, please use a different email or login.")]
    EmailTaken,

    #[error("password hashing failed")]
    Hash,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Hash a password with Argon2id and default parameters, producing a
/// PHC-format string that embeds salt and parameters.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if hashing fails
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("password hashing failed: {e}");
            AuthError::Hash
        })
}

/// Verify a password against a stored PHC-format hash. Any parse or
/// verification failure is simply "no match".
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn validate_login(email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if !EMAIL_RE.is_match(email) {
        errors.email.push("Invalid email address".to_string());
    }
    if password.is_empty() {
        errors.password.push("Password is required".to_string());
    }
    errors
}

fn validate_signup(name: &str, email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if name.trim().is_empty() {
        errors.name.push("Name is required".to_string());
    }
    if !EMAIL_RE.is_match(email) {
        errors.email.push("Invalid email address".to_string());
    }
    if password.len() < MIN_PASSWORD_LEN {
        errors
            .password
            .push(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    errors
}

/// Validates submitted credentials against stored user records. Session
/// creation is the session manager's job; this type only answers "who is
/// this, and did they prove it".
#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Check a login attempt. On success returns the matched user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for malformed form input
    /// - [`AuthError::InvalidCredentials`] when email or password is wrong,
    ///   without distinguishing which
    /// - [`AuthError::Store`] when the user store is unreachable
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let errors = validate_login(email, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let Some(user) = self.users.find_by_email(email).await? else {
            log::debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            log::debug!("login rejected: password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Register a new user. On success returns the stored user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for malformed form input
    /// - [`AuthError::EmailTaken`] when the email is already registered
    /// - [`AuthError::Hash`] when password hashing fails
    /// - [`AuthError::Store`] when the user store is unreachable
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let errors = validate_signup(name, email, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .users
            .insert(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
            })
            .await?;

        log::info!("registered user {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;
    use crate::testing::{FailingUserStore, TestFixtures};

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
    }

    #[test]
    fn test_verify_against_garbage_hash_is_false() {
        assert!(!verify_password("anything", "not-a-phc-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_signup_validation_rules() {
        let errors = validate_signup("", "not-an-email", "short");
        assert_eq!(errors.name, vec!["Name is required"]);
        assert_eq!(errors.email, vec!["Invalid email address"]);
        assert_eq!(errors.password, vec!["Password must be at least 6 characters"]);

        assert!(validate_signup("Ada", "ada@example.com", "longenough").is_empty());
    }

    #[test]
    fn test_field_errors_serialize_only_populated_fields() {
        let errors = validate_login("bad-email", "pw");
        let json = serde_json::to_string(&errors).unwrap();
        assert!(json.contains("email"));
        assert!(!json.contains("password"));
        assert!(!json.contains("name"));
    }

    #[tokio::test]
    async fn test_login_success() {
        let (verifier, users, registered) =
            TestFixtures::verifier_with_user("ada@example.com", "correct horse").await;

        let user = verifier.login("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.id, registered.id);

        let stored = users.find_by_id(&user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "correct horse");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
        let (verifier, _, _) =
            TestFixtures::verifier_with_user("ada@example.com", "correct horse").await;

        let wrong_password = verifier
            .login("ada@example.com", "battery staple")
            .await
            .unwrap_err();
        let unknown_email = verifier
            .login("nobody@example.com", "battery staple")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown_email.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let (verifier, _, _) =
            TestFixtures::verifier_with_user("ada@example.com", "correct horse").await;
        let result = verifier
            .signup("Ada Again", "ada@example.com", "longenough")
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_user_store_fault_is_not_a_credential_rejection() {
        let verifier = CredentialVerifier::new(Arc::new(FailingUserStore));

        let login = verifier.login("ada@example.com", "correct horse").await;
        assert!(matches!(login, Err(AuthError::Store(_))));

        let signup = verifier.signup("Ada", "ada@example.com", "longenough").await;
        assert!(matches!(signup, Err(AuthError::Store(_))));
    }

    #[tokio::test]
    async fn test_signup_stores_hash_not_cleartext() {
        let users = Arc::new(MemoryUserStore::new());
        let verifier = CredentialVerifier::new(users.clone());

        verifier
            .signup("Ada", "ada@example.com", "cleartext-password")
            .await
            .unwrap();

        let stored = users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "cleartext-password");
        assert!(verify_password("cleartext-password", &stored.password_hash));
    }
}
