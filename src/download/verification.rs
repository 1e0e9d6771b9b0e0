//! Download integrity checking.
//!
//! Recomputes a SHA-256 digest over a fully-written staging file and compares
//! it against the digest the catalog published for the build. Comparison is
//! case-insensitive since catalogs disagree about hex casing.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::core::{Result, UpdateError};

/// Verifies the integrity of a downloaded artifact using SHA-256.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the hex-encoded SHA-256 digest of a file.
    pub async fn compute_sha256(path: &Path) -> Result<String> {
        debug!(path = %path.display(), "computing SHA-256 digest");

        let contents = fs::read(path).await?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Verify a file against the catalog's published digest.
    ///
    /// On mismatch the file is left where it is; promoting it is the
    /// caller's responsibility and must not happen.
    pub async fn verify(path: &Path, expected: &str) -> Result<()> {
        info!(path = %path.display(), "verifying artifact integrity");

        let actual = Self::compute_sha256(path).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(UpdateError::Integrity {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }

        info!("integrity check passed");
        Ok(())
    }
}
