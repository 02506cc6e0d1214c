#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the wicket application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod credentials;
pub mod handlers;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
pub mod token;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use credentials::CredentialVerifier;
pub use models::{Identity, SessionRecord};
pub use session::SessionManager;
pub use settings::WicketSettings;
pub use token::TokenCodec;
