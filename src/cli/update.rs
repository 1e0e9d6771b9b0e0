//! The `update` command: the full check / select / download / install
//! pipeline.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use crate::catalog::CatalogClient;
use crate::cli::common::{SelectArgs, StateArgs, TargetArgs};
use crate::updater::{UpdateOptions, UpdateOutcome, Updater};

/// Download and install the selected build, replacing the current binary.
///
/// By default the command first checks whether the selected target differs
/// from the installed state and exits early when it does not. The existing
/// binary is backed up for the duration of the attempt and restored if the
/// replacement fails partway.
#[derive(Parser, Debug)]
pub struct UpdateCommand {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    select: SelectArgs,

    /// Prompt for the version and build instead of using the defaults.
    #[arg(short, long)]
    interactive: bool,

    /// Skip the freshness check and go straight to the install.
    #[arg(long)]
    no_check: bool,

    /// Fresh install: do not expect or touch an existing binary.
    #[arg(long)]
    fresh: bool,

    /// Do not back up the existing binary before replacing it.
    #[arg(long)]
    no_backup: bool,

    /// Skip the SHA-256 integrity check of the download.
    #[arg(long)]
    no_verify: bool,

    /// Name to install the new binary under.
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Copy the old binary here before installing.
    #[arg(long, value_name = "PATH")]
    copy_old: Option<PathBuf>,
}

impl UpdateCommand {
    /// Run the update pipeline against the catalog at `api`.
    pub async fn execute(self, api: &str) -> Result<()> {
        let catalog = CatalogClient::new(api);
        let store = self.state.store(&self.target.path);
        let mut updater = Updater::load(catalog, store, self.state.overrides())
            .await
            .interactive(self.interactive)
            .verify(!self.no_verify);

        println!("Installed: {}", updater.installed());

        if !self.no_check
            && !self.fresh
            && !updater
                .check_for_update(&self.select.version, &self.select.build)
                .await?
        {
            println!("{}", "Already up to date.".green());
            return Ok(());
        }

        let options = UpdateOptions {
            target: self.target.path.clone(),
            default_version: self.select.version.clone(),
            default_build: self.select.build.clone(),
            backup: !(self.no_backup || self.fresh),
            fresh_install: self.fresh,
            output_name: self.output.clone(),
            secondary_copy: self.copy_old.clone(),
        };

        match updater.perform_update(options).await? {
            UpdateOutcome::Installed { version, build } => {
                println!(
                    "{}",
                    format!("Update complete: now on version {version} build {build}.").green()
                );
            }
            UpdateOutcome::Aborted { reason } => {
                println!("{}", format!("No update performed: {reason}.").yellow());
            }
        }

        Ok(())
    }
}
