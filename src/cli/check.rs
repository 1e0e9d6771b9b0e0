//! The `check` command: report whether an update is available without
//! installing anything.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::catalog::CatalogClient;
use crate::cli::common::{SelectArgs, StateArgs, TargetArgs};
use crate::updater::Updater;

/// Check the catalog for a newer version or build.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    select: SelectArgs,
}

impl CheckCommand {
    /// Run the check against the catalog at `api`.
    pub async fn execute(self, api: &str) -> Result<()> {
        let catalog = CatalogClient::new(api);
        let store = self.state.store(&self.target.path);
        let updater = Updater::load(catalog, store, self.state.overrides()).await;

        println!("Installed: {}", updater.installed());

        if updater
            .check_for_update(&self.select.version, &self.select.build)
            .await?
        {
            println!("{}", "Update available. Run `srvup update` to install it.".green());
        } else {
            println!("{}", "No update available.".green());
        }

        Ok(())
    }
}
