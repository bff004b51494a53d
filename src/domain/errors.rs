//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these; the HTTP adapter maps these to status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing or malformed input. Message is shown to the client.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (email, project name, department name).
    #[error("{0}")]
    Conflict(String),

    /// No credentials presented, or credentials rejected at login.
    #[error("{0}")]
    Unauthorized(String),

    /// Credentials presented but not acceptable (bad token, insufficient role).
    #[error("{0}")]
    Forbidden(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Authentication backend error: {0}")]
    Auth(String),

    /// Upload could not be read as a spreadsheet. Client-facing.
    #[error("Import failed: {0}")]
    Import(String),

    #[error("Notification failed: {0}")]
    Notifier(String),

    /// Runtime failure unrelated to input, e.g. a crashed blocking task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    /// True for errors whose message is safe to return to a client verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_)
                | DomainError::NotFound(_)
                | DomainError::Conflict(_)
                | DomainError::Unauthorized(_)
                | DomainError::Forbidden(_)
                | DomainError::Import(_)
        )
    }
}
