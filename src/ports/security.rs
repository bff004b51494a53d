//! Credential and session-token ports.
//!
//! Both are synchronous; hashing is CPU-bound, so callers move it off the runtime.

use crate::domain::{DomainError, Principal, User};

pub trait PasswordPort: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, DomainError>;

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, DomainError>;
}

pub trait TokenPort: Send + Sync {
    /// Issue a signed bearer token for `user`.
    fn issue(&self, user: &User) -> Result<String, DomainError>;

    /// Verify signature and expiry.
    ///
    /// # Errors
    /// `DomainError::Forbidden` for a bad or expired token.
    fn verify(&self, token: &str) -> Result<Principal, DomainError>;
}
