//! Core types shared across the update pipeline.
//!
//! Currently this is the error taxonomy: the strongly-typed [`UpdateError`]
//! used inside the pipeline and the [`ErrorContext`] presentation layer used
//! at the CLI boundary.

pub mod error;

pub use error::{ErrorContext, InstallStep, RollbackOutcome, UpdateError, user_friendly_error};

/// Convenience alias for pipeline results.
pub type Result<T> = std::result::Result<T, UpdateError>;
