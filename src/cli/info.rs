//! The `info` command: display the catalog's metadata for a build.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::catalog::CatalogClient;
use crate::cli::common::{SelectArgs, StateArgs, TargetArgs};
use crate::updater::Updater;

/// Show version, build, creation time, artifact name, digest, and the
/// changeset for the selected build.
#[derive(Parser, Debug)]
pub struct InfoCommand {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    select: SelectArgs,
}

impl InfoCommand {
    /// Fetch and print the selected build's descriptor.
    pub async fn execute(self, api: &str) -> Result<()> {
        let catalog = CatalogClient::new(api);
        let store = self.state.store(&self.target.path);
        let updater = Updater::load(catalog, store, self.state.overrides()).await;

        let descriptor = updater
            .descriptor(&self.select.version, &self.select.build)
            .await?;

        println!("{}", "Build information".bold());
        println!("  Version:  {}", descriptor.version);
        println!("  Build:    {}", descriptor.build);
        println!("  Created:  {}", descriptor.created_at);
        println!("  File:     {}", descriptor.download_name());
        println!("  SHA-256:  {}", descriptor.sha256());

        if descriptor.changes.is_empty() {
            println!("\nNo recorded changes.");
        } else {
            println!("\nChanges:");
            for change in &descriptor.changes {
                println!("  {} {}", change.commit.yellow(), change.summary);
            }
        }

        Ok(())
    }
}
