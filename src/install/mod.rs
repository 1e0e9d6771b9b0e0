//! Installation of a staged artifact into its final location.
//!
//! One [`InstallManager`] drives one install attempt over a fixed sequence:
//! optional secondary copy of the old file, backup into staging, deletion of
//! the old file, copy of the staged artifact into place. A failure before
//! anything destructive has happened aborts with the target untouched; a
//! failure after the old file is gone triggers a best-effort rollback from
//! the backup when one exists.
//!
//! The backup lives inside the attempt's staging directory, so it survives
//! exactly as long as the attempt does. A backup is created if and only if
//! an original file existed at the target and backup was requested for a
//! non-fresh install; rollback is only attempted when a backup exists, and
//! it restores to the pre-delete location only.
//!
//! Rollback is itself fallible: a missing target during restore is benign
//! (the file is already gone), any other failure is
//! [`RollbackOutcome::Unrecoverable`] and must be surfaced to the operator
//! as requiring manual intervention.
//!
//! Known risk window: an external interrupt landing between the deletion
//! and the replacement copy leaves the target absent, with the backup still
//! in staging. Nothing here resolves that; there is also no advisory lock
//! on the target, so two simultaneous invocations against the same path can
//! race each other.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::{InstallStep, Result, RollbackOutcome, UpdateError};

/// File name of the backup inside the staging directory.
const BACKUP_NAME: &str = "backup";

/// Options controlling one install attempt.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Back up the existing file into staging before replacing it.
    pub backup: bool,
    /// Fresh install: no existing file is expected, so the backup and
    /// deletion steps are skipped even if one happens to be present.
    pub fresh_install: bool,
    /// Copy the existing file here before anything else is done.
    pub secondary_copy: Option<PathBuf>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            backup: true,
            fresh_install: false,
            secondary_copy: None,
        }
    }
}

/// Performs the backup / replace sequence for one staged artifact.
///
/// The manager does not own the staging directory; the orchestrator creates
/// it per attempt and discards it (backup included) after the attempt ends.
pub struct InstallManager {
    /// Staging directory of the current attempt.
    staging: PathBuf,
}

impl InstallManager {
    /// Create a manager for an attempt staged in `staging`.
    pub fn new(staging: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
        }
    }

    /// Path where this attempt's backup is kept.
    pub fn backup_path(&self) -> PathBuf {
        self.staging.join(BACKUP_NAME)
    }

    /// Install `staged` at `target`, returning the final installed path.
    ///
    /// When `target` is a directory the artifact keeps its staged file name
    /// inside it. See the module docs for the step sequence and rollback
    /// semantics.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InstallStep`] tagged with the failing step; when a
    /// rollback was attempted its outcome is attached so a recovered target
    /// and an unrecoverable one are reported distinctly.
    pub async fn install(
        &self,
        staged: &Path,
        target: &Path,
        options: &InstallOptions,
    ) -> Result<PathBuf> {
        let target = resolve_target(staged, target);

        info!(
            staged = %staged.display(),
            target = %target.display(),
            "installing artifact"
        );

        // Step 1: secondary copy of the old file. Nothing destructive has
        // happened yet, so a failure here aborts with no rollback needed.
        if let Some(copy_to) = &options.secondary_copy
            && target.is_file()
        {
            debug!(from = %target.display(), to = %copy_to.display(), "copying old file");
            fs::copy(&target, copy_to).await.map_err(|source| {
                UpdateError::InstallStep {
                    step: InstallStep::SecondaryCopy,
                    rollback: None,
                    source,
                }
            })?;
        }

        // Step 2: backup into staging. Target is still untouched on failure.
        let mut backup = None;
        if options.backup && target.is_file() && !options.fresh_install {
            let backup_path = self.backup_path();
            debug!(path = %backup_path.display(), "creating backup of previous installation");
            fs::copy(&target, &backup_path).await.map_err(|source| {
                UpdateError::InstallStep {
                    step: InstallStep::Backup,
                    rollback: None,
                    source,
                }
            })?;
            backup = Some(backup_path);
        }

        // Step 3: delete the old file. From here on the target is in play,
        // so failures roll back when a backup exists.
        if target.is_file() && !options.fresh_install {
            debug!(path = %target.display(), "deleting current file");
            if let Err(source) = fs::remove_file(&target).await {
                let rollback = match &backup {
                    Some(_) => Some(self.recover_backup(&target).await),
                    None => None,
                };
                return Err(UpdateError::InstallStep {
                    step: InstallStep::Deletion,
                    rollback,
                    source,
                });
            }
        }

        // Step 4: copy the staged artifact into place.
        if let Err(source) = fs::copy(staged, &target).await {
            let rollback = match &backup {
                Some(_) => Some(self.recover_backup(&target).await),
                None => None,
            };
            return Err(UpdateError::InstallStep {
                step: InstallStep::Copy,
                rollback,
                source,
            });
        }

        info!(path = %target.display(), "installation complete");
        Ok(target)
    }

    /// Best-effort restore of the backup to the original location.
    ///
    /// Deletes whatever is at `original` first; a missing file there is
    /// benign (it is already gone), any other failure — and any failure of
    /// the restore copy — is unrecoverable and leaves the backup in staging
    /// for manual recovery.
    async fn recover_backup(&self, original: &Path) -> RollbackOutcome {
        let backup = self.backup_path();
        warn!(
            backup = %backup.display(),
            target = %original.display(),
            "install failed; attempting to restore previous installation"
        );

        match fs::remove_file(original).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("target already absent; continuing restore");
            }
            Err(err) => {
                return RollbackOutcome::Unrecoverable {
                    reason: format!("could not remove {}: {err}", original.display()),
                };
            }
        }

        if let Err(err) = fs::copy(&backup, original).await {
            return RollbackOutcome::Unrecoverable {
                reason: format!(
                    "could not copy backup {} to {}: {err}",
                    backup.display(),
                    original.display()
                ),
            };
        }

        info!("previous installation restored");
        RollbackOutcome::Recovered
    }
}

/// Resolve the final file path for a target that may be a directory.
fn resolve_target(staged: &Path, target: &Path) -> PathBuf {
    if target.is_dir() {
        match staged.file_name() {
            Some(name) => target.join(name),
            None => target.to_path_buf(),
        }
    } else {
        target.to_path_buf()
    }
}
