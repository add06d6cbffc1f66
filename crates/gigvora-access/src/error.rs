//! Error types for Gigvora Access.
//!
//! All errors are strongly typed and propagated without panicking.
//! Lookups that simply miss return `None`/`false`; errors are reserved for
//! broken matrices, configuration, and explicit permission requirements.

use crate::matrix::ValidationReport;

/// Access error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Invalid permission key: {0:?}")]
    InvalidPermissionKey(String),

    #[error("Invalid membership key: {0:?}")]
    InvalidMembershipKey(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Unknown membership: {0}")]
    UnknownMembership(String),

    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("Permission matrix failed validation with {} issue(s)", .0.issues.len())]
    InvalidMatrix(ValidationReport),

    #[error("Permission registry has not been initialized")]
    RegistryNotInitialized,

    #[error("Permission registry is already initialized")]
    RegistryAlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AccessError>;
