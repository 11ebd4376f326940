//! Authentication and session management
//!
//! This module performs the RSA-encrypted login against the site and keeps
//! the resulting session cookies as one explicit, reusable Cookie header:
//! - Key fetch and credential encryption ([`crypto`])
//! - Cookie extraction and aggregation ([`cookies`])
//! - The login state machine itself ([`manager`])

pub mod cookies;
pub mod crypto;
pub mod manager;

pub use cookies::{CookieHeader, SESSION_COOKIE};
pub use crypto::RsaKeyMaterial;
pub use manager::{AuthManager, AuthState, Credentials};
