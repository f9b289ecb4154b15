//! Admin authentication for the Starke backend.
//!
//! There is a single administrator account configured at startup. A
//! successful [`Authenticator::login`] issues an HS256 JWT carrying the
//! admin email; protected routes call [`Authenticator::verify`] with the
//! bearer token. Issued tokens are also recorded in a small JSON file so a
//! logout can revoke them when the store is enforced.

pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod token;

pub use config::AuthSettings;
pub use error::AuthError;
pub use service::Authenticator;
pub use store::TokenStore;
pub use token::Claims;
