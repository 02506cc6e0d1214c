//! Session protocol: token issuance, verification, renewal, and revocation
//!
//! The protocol decisions live in [`manager`]; the cookie transport that
//! carries the signed artifact lives in [`cookie`]. Keeping the two apart
//! means the protocol is testable without an HTTP context.

pub mod cookie;
pub mod manager;

pub use cookie::{extract_session_token, CookieFactory, SESSION_COOKIE};
pub use manager::{IssuedSession, SessionError, SessionManager, MAX_TTL_DAYS};
