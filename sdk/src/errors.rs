//! Error types and handling
//!
//! This module provides the error types used throughout the conference
//! registry. Every error implements the `RegistryErrorExt` trait which
//! provides the short user-facing message shown after a failed operation.
//!
//! # Taxonomy
//!
//! Every variant belongs to one `ErrorKind`:
//!
//! - **NotFound**: account, paper, reviewer, professor, session, meeting or
//!   registration lookup failed
//! - **Conflict**: duplicate registration, duplicate reviewer assignment,
//!   duplicate signup email, duplicate review or a refused status transition
//! - **Validation**: a form field is missing or malformed
//! - **Forbidden**: the active identity may not perform the action
//! - **Internal**: configuration, snapshot or I/O failure
//!
//! A failed registry operation never leaves partial changes behind.

use thiserror::Error;

/// Trait for registry error extensions
///
/// Provides the message shown to the person who triggered the failing
/// operation, plus whether retrying with different input can succeed.
pub trait RegistryErrorExt {
    /// Returns a short user-facing message for the error
    ///
    /// The message never contains passwords or internal paths.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are fixed by changing the input. Non-recoverable
    /// errors need manual intervention (a broken config or state file).
    fn is_recoverable(&self) -> bool;
}

/// Error category, see the module documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Forbidden,
    Internal,
}

/// Main registry error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{ErrorKind, RegistryError, RegistryErrorExt};
///
/// let error = RegistryError::AlreadyRegistered {
///     session_id: "s-1".to_string(),
///     user: "alice@x.com".to_string(),
/// };
/// assert_eq!(error.kind(), ErrorKind::Conflict);
/// assert_eq!(error.user_hint(), "You are already registered for this session!");
/// ```
#[derive(Debug, Error)]
pub enum RegistryError {
    // Account errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    // Paper errors
    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Reviewer not found: {0}")]
    ReviewerNotFound(String),

    #[error("Reviewer {reviewer} already assigned to paper {paper_id}")]
    ReviewerAlreadyAssigned { paper_id: String, reviewer: String },

    // Review errors
    #[error("Reviewer {reviewer} already reviewed paper {paper_id}")]
    DuplicateReview { paper_id: String, reviewer: String },

    // Session errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("{user} already registered for session {session_id}")]
    AlreadyRegistered { session_id: String, user: String },

    #[error("{user} is not registered for session {session_id}")]
    NotRegistered { session_id: String, user: String },

    // Meeting errors
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("Professor not found: {0}")]
    ProfessorNotFound(String),

    // State machine errors
    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    // Form errors
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    // Shell errors
    #[error("No active identity")]
    NotSignedIn,

    #[error("Role {role} may not {action}")]
    Forbidden { action: String, role: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials
            | Self::AccountNotFound(_)
            | Self::PaperNotFound(_)
            | Self::ReviewerNotFound(_)
            | Self::SessionNotFound(_)
            | Self::NotRegistered { .. }
            | Self::MeetingNotFound(_)
            | Self::ProfessorNotFound(_) => ErrorKind::NotFound,

            Self::DuplicateAccount(_)
            | Self::ReviewerAlreadyAssigned { .. }
            | Self::DuplicateReview { .. }
            | Self::AlreadyRegistered { .. }
            | Self::InvalidTransition { .. } => ErrorKind::Conflict,

            Self::MissingField(_) | Self::InvalidField { .. } => ErrorKind::Validation,

            Self::NotSignedIn | Self::Forbidden { .. } => ErrorKind::Forbidden,

            Self::Config(_) | Self::Snapshot(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for an `InvalidField` error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl RegistryErrorExt for RegistryError {
    fn user_hint(&self) -> &str {
        match self {
            // Account errors
            Self::InvalidCredentials => "Invalid credentials. Try one of the test accounts.",
            Self::AccountNotFound(_) => "No account exists for this email.",
            Self::DuplicateAccount(_) => "An account with this email already exists!",

            // Paper errors
            Self::PaperNotFound(_) => "This paper no longer exists.",
            Self::ReviewerNotFound(_) => "Select a valid reviewer.",
            Self::ReviewerAlreadyAssigned { .. } => "Reviewer already assigned to this paper!",

            // Review errors
            Self::DuplicateReview { .. } => "You have already reviewed this paper!",

            // Session errors
            Self::SessionNotFound(_) => "This session no longer exists.",
            Self::AlreadyRegistered { .. } => "You are already registered for this session!",
            Self::NotRegistered { .. } => "You are not registered for this session.",

            // Meeting errors
            Self::MeetingNotFound(_) => "This meeting request no longer exists.",
            Self::ProfessorNotFound(_) => "Select a valid professor.",

            // State machine errors
            Self::InvalidTransition { .. } => "This decision has already been made.",

            // Form errors
            Self::MissingField(_) => "Please fill out all required fields.",
            Self::InvalidField { .. } => "Please check the highlighted field.",

            // Shell errors
            Self::NotSignedIn => "Log in first with 'confreg login'.",
            Self::Forbidden { .. } => "Your portal does not offer this action.",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Snapshot(_) => "The saved registry state is unreadable",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Snapshot(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_taxonomy() {
        assert_eq!(
            RegistryError::PaperNotFound("p".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RegistryError::ReviewerAlreadyAssigned {
                paper_id: "p".to_string(),
                reviewer: "r".to_string(),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            RegistryError::MissingField("title".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(RegistryError::NotSignedIn.kind(), ErrorKind::Forbidden);
        assert_eq!(
            RegistryError::Config("bad".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = RegistryError::InvalidTransition {
            entity: "paper",
            from: "Accepted".to_string(),
            to: "Rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid paper status transition: Accepted -> Rejected"
        );

        let err = RegistryError::invalid_field("rating", "must be between 1 and 5");
        assert_eq!(
            err.to_string(),
            "Invalid field rating: must be between 1 and 5"
        );
    }

    #[test]
    fn test_hint_never_leaks_credentials() {
        let err = RegistryError::InvalidCredentials;
        assert!(!err.user_hint().contains("pass123"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_internal_errors_not_recoverable() {
        assert!(!RegistryError::Snapshot("truncated".to_string()).is_recoverable());
        assert!(!RegistryError::Config("bad".to_string()).is_recoverable());
        assert!(RegistryError::SessionNotFound("s".to_string()).is_recoverable());
    }
}
