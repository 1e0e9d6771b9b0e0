//! The update orchestrator.
//!
//! [`Updater`] owns the persistent [`InstalledState`] and sequences the
//! pipeline: check the catalog, resolve the requested version and build,
//! stream the artifact into a staging directory, verify it, and hand it to
//! the install manager. Only a fully successful install mutates and persists
//! the state; any component failure simply ends the operation and leaves the
//! prior state intact, so repeated failed attempts are idempotent.
//!
//! There is no orchestrator-level retry. The single deliberate exception to
//! "clean up staging on every exit" is an unrecoverable rollback: the
//! staging directory still holds the backup, so it is preserved and its path
//! logged for manual recovery.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::catalog::{BuildDescriptor, CatalogClient};
use crate::config::{InstalledState, StateStore};
use crate::core::{Result, UpdateError};
use crate::download::{ArtifactDownloader, BlockProgress};
use crate::install::{InstallManager, InstallOptions};
use crate::select::{self, SelectKind, Selectable, Selector};
use crate::utils::progress::DownloadProgress;

/// CLI-supplied overrides of the loaded installed state.
#[derive(Debug, Clone, Default)]
pub struct StateOverrides {
    /// Treat this as the installed version, ignoring the record.
    pub version: Option<String>,
    /// Treat this as the installed build, ignoring the record.
    pub build: Option<i64>,
}

/// Options for one [`Updater::perform_update`] run.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Install target: the binary's path, or the directory to place it in.
    pub target: PathBuf,
    /// Default version selector when the user does not pick one.
    pub default_version: Selector,
    /// Default build selector when the user does not pick one.
    pub default_build: Selector,
    /// Back up the existing file before replacing it.
    pub backup: bool,
    /// Fresh install: skip the backup and deletion of an existing file.
    pub fresh_install: bool,
    /// Override the installed file name.
    pub output_name: Option<String>,
    /// Copy the old file here before the install.
    pub secondary_copy: Option<PathBuf>,
}

/// How a [`Updater::perform_update`] run ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The artifact was downloaded, verified, installed, and the state
    /// persisted.
    Installed {
        /// Version now installed.
        version: String,
        /// Build now installed.
        build: i64,
    },
    /// The operation ended early with no update performed and no state
    /// mutated: a selection could not be satisfied non-interactively, or
    /// the user declined the confirmation prompt.
    Aborted {
        /// Human-readable reason for the abort.
        reason: String,
    },
}

/// Result of target selection: a concrete pair, or an abort.
enum Selected {
    Target(String, i64),
    Aborted(String),
}

/// Sequences check / select / download / install and owns the state.
pub struct Updater {
    catalog: CatalogClient,
    store: Option<StateStore>,
    state: InstalledState,
    interactive: bool,
    verify: bool,
}

impl Updater {
    /// Load the installed state and build an orchestrator around it.
    ///
    /// `store` is `None` when the state record should be skipped entirely;
    /// overrides take precedence over whatever the record says.
    pub async fn load(
        catalog: CatalogClient,
        store: Option<StateStore>,
        overrides: StateOverrides,
    ) -> Self {
        let mut state = match &store {
            Some(store) => store.load().await,
            None => {
                debug!("skipping state record");
                InstalledState::unknown()
            }
        };
        if let Some(version) = overrides.version {
            state.version = version;
        }
        if let Some(build) = overrides.build {
            state.build = build;
        }
        info!(%state, "installed state");

        Self {
            catalog,
            store,
            state,
            interactive: false,
            verify: true,
        }
    }

    /// Enable interactive version/build prompting and confirmation.
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Enable or disable the download integrity check.
    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// The currently-installed version and build.
    pub fn installed(&self) -> &InstalledState {
        &self.state
    }

    /// Check whether the catalog offers something newer than the installed
    /// state.
    ///
    /// Resolves the default selectors (non-interactively) against the
    /// catalog and compares: a version mismatch short-circuits to `true`
    /// before the build list is fetched at all.
    pub async fn check_for_update(
        &self,
        default_version: &Selector,
        default_build: &Selector,
    ) -> Result<bool> {
        info!("checking for a new version");

        let versions = self.catalog.versions().await?;
        let remote_version = select::resolve(
            &Selector::Default,
            &versions,
            default_version,
            &self.state.version,
            SelectKind::Version,
        )?;

        if remote_version != self.state.version {
            info!(%remote_version, "new version available");
            return Ok(true);
        }

        let builds = self.catalog.builds(&remote_version).await?;
        if builds.is_empty() {
            warn!(version = %remote_version, "catalog lists no builds for the installed version");
            return Ok(false);
        }
        let remote_build = select::resolve(
            &Selector::Default,
            &builds,
            default_build,
            &self.state.build,
            SelectKind::Build,
        )?;

        if remote_build != self.state.build {
            info!(remote_build, "new build available");
            Ok(true)
        } else {
            info!("no update available");
            Ok(false)
        }
    }

    /// Fetch the descriptor for the selected version and build.
    ///
    /// Selection here is always non-interactive; the selectors are resolved
    /// as requested values with `latest` as the default.
    pub async fn descriptor(
        &self,
        version: &Selector,
        build: &Selector,
    ) -> Result<BuildDescriptor> {
        let versions = self.catalog.versions().await?;
        let version = select::resolve(
            version,
            &versions,
            &Selector::Latest,
            &self.state.version,
            SelectKind::Version,
        )?;

        let builds = self.catalog.builds(&version).await?;
        if builds.is_empty() {
            return Err(UpdateError::NoBuildsAvailable { version });
        }
        let build = select::resolve(
            build,
            &builds,
            &Selector::Latest,
            &self.state.build,
            SelectKind::Build,
        )?;

        self.catalog.build(&version, build).await
    }

    /// Run selection → download → verify → install.
    ///
    /// On success the installed state is updated and persisted before
    /// returning. Aborts (selection failure in non-interactive mode, user
    /// declining the prompt) are an [`UpdateOutcome`], not an error.
    pub async fn perform_update(&mut self, options: UpdateOptions) -> Result<UpdateOutcome> {
        let (version, build) = match self
            .select_target(&options.default_version, &options.default_build)
            .await?
        {
            Selected::Target(version, build) => (version, build),
            Selected::Aborted(reason) => {
                warn!(%reason, "aborting: no update performed");
                return Ok(UpdateOutcome::Aborted { reason });
            }
        };

        if self.interactive && !confirm_install(&version, build)? {
            return Ok(UpdateOutcome::Aborted {
                reason: "installation declined".to_string(),
            });
        }

        // The staging directory is owned by this attempt alone and removed
        // on every exit path below except an unrecoverable rollback.
        let staging = tempfile::tempdir()?;
        debug!(path = %staging.path().display(), "created staging directory");

        let mut progress = DownloadProgress::new();
        let mut on_block = |block: &BlockProgress| progress.observe(block);
        let staged = ArtifactDownloader::new(&self.catalog)
            .verify(self.verify)
            .download(staging.path(), &version, build, Some(&mut on_block))
            .await?;

        let target = resolve_install_target(
            &options.target,
            options.output_name.as_deref(),
            &staged,
        );

        let manager = InstallManager::new(staging.path());
        let install_options = InstallOptions {
            backup: options.backup,
            fresh_install: options.fresh_install,
            secondary_copy: options.secondary_copy.clone(),
        };

        if let Err(err) = manager.install(&staged, &target, &install_options).await {
            if err.needs_manual_intervention() {
                // Keep the staging directory: it still holds the backup.
                let kept = staging.keep();
                error!(
                    staging = %kept.display(),
                    "rollback failed; staging directory preserved for manual recovery"
                );
            }
            return Err(err);
        }

        self.state = InstalledState {
            version: version.clone(),
            build,
        };
        if let Some(store) = &self.store {
            store.save(&self.state).await?;
        }

        info!(%version, build, "update complete");
        Ok(UpdateOutcome::Installed { version, build })
    }

    /// Resolve the version and build to install.
    async fn select_target(
        &self,
        default_version: &Selector,
        default_build: &Selector,
    ) -> Result<Selected> {
        let versions = self.catalog.versions().await?;
        let version = match self.select_one(
            &versions,
            default_version,
            &self.state.version,
            SelectKind::Version,
        )? {
            Some(version) => version,
            None => return Ok(Selected::Aborted("no matching version".to_string())),
        };

        let builds = self.catalog.builds(&version).await?;
        if builds.is_empty() {
            return Err(UpdateError::NoBuildsAvailable { version });
        }
        let build = match self.select_one(
            &builds,
            default_build,
            &self.state.build,
            SelectKind::Build,
        )? {
            Some(build) => build,
            None => return Ok(Selected::Aborted("no matching build".to_string())),
        };

        info!(%version, build, "selected target");
        Ok(Selected::Target(version, build))
    }

    /// Select one value, re-prompting interactively until it resolves.
    ///
    /// Non-interactively a single [`crate::select::SelectionFailed`] yields `Ok(None)`,
    /// which the caller turns into a pipeline abort.
    fn select_one<T: Selectable>(
        &self,
        choices: &[T],
        default: &Selector,
        current: &T,
        kind: SelectKind,
    ) -> Result<Option<T>> {
        if !self.interactive {
            return match select::resolve(&Selector::Default, choices, default, current, kind) {
                Ok(value) => {
                    info!(%kind, %value, "selected");
                    Ok(Some(value))
                }
                Err(failed) => {
                    warn!(%failed, "selection failed");
                    Ok(None)
                }
            };
        }

        println!("\nAvailable {kind}s:");
        for choice in choices {
            println!("  [{choice}]");
        }
        println!("(leave blank for the default, or enter 'latest' or 'current')");

        loop {
            let input = prompt(&format!("Enter {kind} [{default}]: "))?;
            let requested = Selector::parse(&input);
            match select::resolve(&requested, choices, default, current, kind) {
                Ok(value) => {
                    println!("Selected {kind}: {value}");
                    return Ok(Some(value));
                }
                Err(failed) => println!("{failed}; try again"),
            }
        }
    }
}

/// Ask for confirmation before installing.
fn confirm_install(version: &str, build: i64) -> Result<bool> {
    println!("\nAbout to install version {version} build {build}.");
    let answer = prompt("Continue with the installation? [Y/n]: ")?;
    Ok(!matches!(answer.trim().to_lowercase().as_str(), "n" | "no"))
}

/// Print a prompt and read one line from stdin.
fn prompt(message: &str) -> std::io::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Work out the final file path from the target, the optional output name,
/// and the staged artifact's own name.
fn resolve_install_target(target: &Path, output_name: Option<&str>, staged: &Path) -> PathBuf {
    if target.is_dir() {
        match output_name {
            Some(name) => target.join(name),
            None => match staged.file_name() {
                Some(name) => target.join(name),
                None => target.to_path_buf(),
            },
        }
    } else {
        match (output_name, target.parent()) {
            (Some(name), Some(parent)) => parent.join(name),
            _ => target.to_path_buf(),
        }
    }
}
