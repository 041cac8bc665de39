//! Conference Registry Library
//!
//! In-memory bookkeeping for a small conference: accounts, papers, reviews,
//! sessions with their registrations, and meetings. Used by the `confreg`
//! binary and by the integration tests.

/// Configuration management module
pub mod config;

/// Account, paper, review, session and meeting stores
pub mod store;

/// Derived dashboard views
pub mod aggregate;

/// Form parsing and field validation
pub mod forms;

/// Success and error notices
pub mod notifications;

/// Active identity of the shell
pub mod identity;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

pub use store::{Policy, Registry};
