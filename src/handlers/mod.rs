//! HTTP handlers
//!
//! Thin adapters between the HTTP surface and the session/credential cores:
//! extract the cookie, call the core, map outcomes to status codes, and set
//! or clear the session cookie on the way out.

pub mod auth;
pub mod error;
pub mod user;

pub use auth::{login, logout, renew, signup};
pub use error::ApiError;
pub use user::{current_user, health};
