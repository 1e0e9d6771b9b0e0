//! Error handling for srvup.
//!
//! The error system is built around two core principles:
//! 1. **Strongly-typed errors** for precise handling inside the pipeline
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! [`UpdateError`] enumerates every failure class the update pipeline can
//! produce. Network problems carry the attempted URL and, where the server
//! supplied one, the status code and reason, so a failed run can be diagnosed
//! without re-running in a debug mode. Install failures are tagged with the
//! step that failed ([`InstallStep`]) and, when a rollback was attempted, its
//! outcome ([`RollbackOutcome`]).
//!
//! None of these conditions is retried automatically; a retry is always a
//! user-initiated re-run of the command.
//!
//! At the CLI boundary, [`user_friendly_error`] converts any `anyhow::Error`
//! into an [`ErrorContext`] that renders the failure with a colored header
//! and a per-class suggestion.

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The step of an install attempt that failed.
///
/// Mirrors the install sequence: the optional secondary copy of the old file,
/// the backup into staging, the deletion of the current file, and the final
/// copy of the staged artifact into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Copying the existing file to the requested secondary location.
    SecondaryCopy,
    /// Copying the existing file into the staging area as a backup.
    Backup,
    /// Deleting the existing file before the replacement copy.
    Deletion,
    /// Copying the staged artifact to the target path.
    Copy,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SecondaryCopy => "secondary copy",
            Self::Backup => "backup",
            Self::Deletion => "deletion",
            Self::Copy => "install copy",
        };
        f.write_str(name)
    }
}

/// Result of a best-effort rollback after a failed install step.
///
/// `Recovered` means the previous file is back in place byte-for-byte.
/// `Unrecoverable` is the one condition that requires manual operator
/// intervention: the old file could not be restored and the staging
/// directory (which still holds the backup) is preserved for recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The backup was copied back to the original location.
    Recovered,
    /// The backup could not be restored.
    Unrecoverable {
        /// Why the restore failed.
        reason: String,
    },
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recovered => f.write_str("previous file recovered"),
            Self::Unrecoverable { reason } => {
                write!(f, "previous file could NOT be recovered: {reason}")
            }
        }
    }
}

/// The main error type for srvup operations.
///
/// Every variant carries enough context for diagnostic reporting: attempted
/// URLs for network failures, expected/actual digests for integrity failures,
/// the failing step and rollback outcome for install failures.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Transport-level failure: connectivity, DNS, timeout, TLS.
    ///
    /// The request never produced an HTTP response.
    #[error("network error while contacting {url}")]
    Network {
        /// The URL that was being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("server returned {status} for {url}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase, when one is known.
        reason: Option<String>,
    },

    /// The server answered 2xx but the body was not the expected JSON shape.
    #[error("unexpected response body from {url}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// The deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The download response did not declare a `content-length`.
    ///
    /// A declared length is a hard precondition of the block-wise download;
    /// it is never silently tolerated.
    #[error("response for {url} did not declare a content length")]
    MissingLength {
        /// The download URL.
        url: String,
    },

    /// The download response named a file outside the staging directory.
    #[error("refusing download filename {name:?}: not a plain file name")]
    UnsafeFilename {
        /// The name derived from the `content-disposition` header.
        name: String,
    },

    /// The downloaded file's SHA-256 digest does not match the published one.
    ///
    /// The file is left in staging and never promoted to the target.
    #[error("integrity check failed for {path}")]
    Integrity {
        /// Path of the staged file that failed verification.
        path: PathBuf,
        /// The digest published by the catalog.
        expected: String,
        /// The digest computed over the written file.
        actual: String,
    },

    /// The selected version has no builds in the catalog.
    ///
    /// A distinct terminal condition, not a selection failure on a value:
    /// the version itself is valid, there is simply nothing to download yet.
    #[error("no builds available for version {version}")]
    NoBuildsAvailable {
        /// The version that has no builds.
        version: String,
    },

    /// A requested version or build was not offered by the catalog.
    ///
    /// Produced when a non-interactive run cannot recover by re-prompting.
    #[error("{0}")]
    Selection(#[from] crate::select::SelectionFailed),

    /// An install step failed.
    ///
    /// `rollback` is `None` when no rollback was attempted (nothing
    /// destructive had happened yet, or no backup existed) and `Some` with
    /// the outcome when one was.
    #[error("installation failed at step: {step}")]
    InstallStep {
        /// The step that failed.
        step: InstallStep,
        /// Outcome of the rollback, when one was attempted.
        rollback: Option<RollbackOutcome>,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// IO error outside the install sequence (staging, state record).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpdateError {
    /// Whether this failure left the system needing manual intervention.
    ///
    /// True only for an install failure whose rollback was unrecoverable.
    pub fn needs_manual_intervention(&self) -> bool {
        matches!(
            self,
            Self::InstallStep {
                rollback: Some(RollbackOutcome::Unrecoverable { .. }),
                ..
            }
        )
    }
}

/// A user-facing rendering of an error: message, optional details, optional
/// suggestion.
///
/// Built by [`user_friendly_error`] at the CLI boundary and displayed with
/// colors on stderr.
pub struct ErrorContext {
    /// The top-level message shown to the user.
    pub message: String,
    /// Extra lines of context (status codes, digests, rollback outcome).
    pub details: Vec<String>,
    /// A suggested next action, when one is known.
    pub suggestion: Option<String>,
    /// Whether the failure requires manual operator intervention.
    pub fatal: bool,
}

impl ErrorContext {
    /// Print the error report to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.message);
        for line in &self.details {
            eprintln!("  {line}");
        }
        if self.fatal {
            eprintln!(
                "{}",
                "manual intervention required: the previous installation was not restored"
                    .red()
                    .bold()
            );
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "hint:".cyan().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for line in &self.details {
            write!(f, "\n  {line}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nhint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// When the chain bottoms out in an [`UpdateError`], the context gets
/// class-specific details and a suggestion; otherwise the plain chain is
/// rendered.
pub fn user_friendly_error(error: &anyhow::Error) -> ErrorContext {
    let message = error.to_string();

    let Some(update_error) = error.downcast_ref::<UpdateError>() else {
        let details = error.chain().skip(1).map(|cause| cause.to_string()).collect();
        return ErrorContext {
            message,
            details,
            suggestion: None,
            fatal: false,
        };
    };

    let mut details = Vec::new();
    let mut suggestion = None;

    match update_error {
        UpdateError::Network { source, .. } => {
            details.push(format!("reason: {source}"));
            suggestion = Some("check your network connection and re-run the command".to_string());
        }
        UpdateError::HttpStatus { status, reason, .. } => {
            if let Some(reason) = reason {
                details.push(format!("the server could not fulfill the request: {reason}"));
            }
            if *status == 404 {
                suggestion = Some(
                    "the requested version or build may not exist; run `srvup info` to inspect the catalog"
                        .to_string(),
                );
            }
        }
        UpdateError::InvalidResponse { source, .. } => {
            details.push(format!("parse error: {source}"));
        }
        UpdateError::MissingLength { .. } => {
            suggestion = Some("the download server is misbehaving; try again later".to_string());
        }
        UpdateError::Integrity { expected, actual, .. } => {
            details.push(format!("expected: {expected}"));
            details.push(format!("actual:   {actual}"));
            suggestion = Some(
                "the download was corrupted in transit; the current install was not altered. \
                 Re-run the command, and if it keeps failing check your network or disk"
                    .to_string(),
            );
        }
        UpdateError::NoBuildsAvailable { version } => {
            suggestion = Some(format!(
                "version {version} may be too new or too old to have builds; \
                 wait for one to be published or select a different version"
            ));
        }
        UpdateError::InstallStep { rollback, source, .. } => {
            details.push(format!("cause: {source}"));
            if let Some(outcome) = rollback {
                details.push(outcome.to_string());
            }
        }
        UpdateError::UnsafeFilename { .. } | UpdateError::Selection(_) | UpdateError::Io(_) => {}
    }

    ErrorContext {
        message,
        details,
        suggestion,
        fatal: update_error.needs_manual_intervention(),
    }
}
