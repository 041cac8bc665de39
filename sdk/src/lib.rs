//! Conference Registry SDK
//!
//! Shared error and form-input types for the registry library and the
//! `confreg` command-line shell.

/// Error types and handling
pub mod errors;

/// Form input types
pub mod types;

// Re-export commonly used types
pub use errors::{ErrorKind, RegistryError, RegistryErrorExt};
pub use types::FormInput;
