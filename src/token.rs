//! Signed session token codec
//!
//! Encodes session claims into a compact three-part signed string
//! (`header.payload.signature`, each part base64url without padding) and
//! verifies them on the way back in. The signature is HMAC-SHA256 over
//! `header.payload` with a process-wide key derived from the configured
//! session secret.
//!
//! The codec is pure: it has no knowledge of the session store, and a
//! successfully decoded token is necessary but not sufficient for an
//! authenticated session (see `session::SessionManager`).

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signing key size (256 bits)
pub const SIGNING_KEY_SIZE: usize = 32;

/// The only accepted signing algorithm. Tokens declaring anything else are
/// rejected outright, never verified under a different scheme.
const ALGORITHM: &str = "HS256";

/// Why a token failed to decode. All variants collapse to "no session" at
/// the session-manager boundary; the distinction exists for logging and
/// for unit-level assertions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Structurally invalid: wrong part count, bad base64, or bad JSON
    #[error("malformed token")]
    Malformed,

    /// Signature mismatch, or a declared algorithm other than HS256
    #[error("invalid token signature")]
    InvalidSignature,

    /// The embedded expiration claim has passed
    #[error("token expired")]
    Expired,
}

/// Claims carried by a session token. Mirrors the session record at signing
/// time; `exp` and `iat` are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session record id
    pub sid: String,
    /// Owner (user) id
    pub sub: String,
    /// Expiration, unix seconds
    pub exp: i64,
    /// Issued-at, unix seconds
    pub iat: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn new(session_id: &str, owner_id: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            sid: session_id.to_string(),
            sub: owner_id.to_string(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        }
    }

    /// Embedded expiration as a `DateTime`, if representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Derive a fixed-size signing key from arbitrary secret material.
///
/// Same construction the cookie-encryption side of this family of services
/// uses: a single SHA-256 digest, so operators can configure a secret of any
/// length without weakening short keys by truncation.
#[must_use]
pub fn derive_signing_key(secret: &[u8]) -> [u8; SIGNING_KEY_SIZE] {
    let digest = Sha256::digest(secret);
    let mut key = [0u8; SIGNING_KEY_SIZE];
    key.copy_from_slice(&digest);
    key
}

/// Stateless encoder/verifier for session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    key: [u8; SIGNING_KEY_SIZE],
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: derive_signing_key(secret),
        }
    }

    /// Encode and sign session claims.
    ///
    /// Deterministic for identical claims and secret; only `iat` inside the
    /// claims varies between issuances.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn encode(&self, claims: &SessionClaims) -> Result<String> {
        let header = serde_json::json!({ "alg": ALGORITHM, "typ": "JWT" });

        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?.as_bytes());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_string(claims)?.as_bytes());

        let message = format!("{header_b64}.{payload_b64}");
        let mut mac =
            HmacSha256::new_from_slice(&self.key).context("invalid HMAC key length")?;
        mac.update(message.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{message}.{signature_b64}"))
    }

    /// Verify and decode a session token.
    ///
    /// The signature check uses `Mac::verify_slice`, which compares in
    /// constant time; the raw bytes are never compared with `==`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Malformed`] for structural problems
    /// - [`TokenError::InvalidSignature`] for a signature mismatch or a
    ///   declared algorithm other than HS256
    /// - [`TokenError::Expired`] when the embedded expiration has passed
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let (header_b64, payload_b64, signature_b64) = split_token(token)?;

        let header: serde_json::Value = decode_json_part(header_b64)?;
        if header.get("alg").and_then(serde_json::Value::as_str) != Some(ALGORITHM) {
            return Err(TokenError::InvalidSignature);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = decode_json_part(payload_b64)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => {
            Ok((header, payload, signature))
        }
        _ => Err(TokenError::Malformed),
    }
}

fn decode_json_part<T: serde::de::DeserializeOwned>(part: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &[u8] = b"test_session_secret_32_chars_min";

    fn claims_expiring_in(days: i64) -> SessionClaims {
        SessionClaims::new("session-1", "user-1", Utc::now() + Duration::days(days))
    }

    #[test]
    fn test_round_trip() {
        let codec = TokenCodec::new(SECRET);
        let claims = claims_expiring_in(7);

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_token_has_three_parts() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.encode(&claims_expiring_in(7)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let codec = TokenCodec::new(SECRET);
        let other = TokenCodec::new(b"a_completely_different_secret_!!");

        let token = codec.encode(&claims_expiring_in(7)).unwrap();
        assert_eq!(other.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_flipped_signature_byte_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.encode(&claims_expiring_in(7)).unwrap();

        // Flip one character in the signature part
        let dot = token.rfind('.').unwrap();
        let (message, signature) = token.split_at(dot + 1);
        let mut sig_bytes: Vec<u8> = signature.bytes().collect();
        sig_bytes[0] = if sig_bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{message}{}", String::from_utf8(sig_bytes).unwrap());

        assert!(matches!(
            codec.decode(&tampered),
            Err(TokenError::InvalidSignature | TokenError::Malformed)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.encode(&claims_expiring_in(7)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = claims_expiring_in(30);
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_string(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(codec.decode(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.encode(&claims_expiring_in(-1)).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = TokenCodec::new(SECRET);

        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
        assert_eq!(codec.decode("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("!!.??.%%"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.encode(&claims_expiring_in(7)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // Re-declare the algorithm as "none", keeping the original signature
        let forged_header =
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#.as_bytes());
        let forged = format!("{}.{}.{}", forged_header, parts[1], parts[2]);

        assert_eq!(codec.decode(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_key_derivation_is_stable() {
        assert_eq!(derive_signing_key(SECRET), derive_signing_key(SECRET));
        assert_ne!(derive_signing_key(SECRET), derive_signing_key(b"other"));
    }
}
