//! Command-line interface for srvup.
//!
//! Each command lives in its own module with its own argument structure and
//! execution logic:
//!
//! - `check` — compare the installed state against the catalog, install
//!   nothing
//! - `update` — run the full download / verify / install pipeline
//! - `info` — display a build's catalog metadata and changeset
//!
//! Global options control verbosity (`--verbose` / `--quiet`), progress
//! rendering (`--no-progress`), and the catalog endpoint (`--api`, also via
//! the `SRVUP_API` environment variable).

pub mod common;

mod check;
mod info;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Default catalog endpoint.
const DEFAULT_API: &str = "https://api.papermc.io/v2/projects/paper";

/// Top-level CLI: global options plus a subcommand.
#[derive(Parser)]
#[command(
    name = "srvup",
    about = "Checks a remote artifact catalog for new server builds and installs them safely",
    version,
    long_about = "srvup checks a remote artifact catalog for newer builds of a server binary, \
                  downloads the selected build, verifies its SHA-256 digest, and swaps it into \
                  place with a backup to roll back to if anything fails."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only output errors and interactive prompts.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Base URL of the artifact catalog.
    #[arg(long, global = true, env = "SRVUP_API", default_value = DEFAULT_API, value_name = "URL")]
    api: String,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check for an available update without installing it.
    Check(check::CheckCommand),

    /// Download, verify, and install a build.
    Update(update::UpdateCommand),

    /// Show catalog information for a build.
    Info(info::InfoCommand),
}

impl Cli {
    /// Apply the global options and dispatch the subcommand.
    pub async fn execute(self) -> Result<()> {
        self.init_output();

        match self.command {
            Commands::Check(cmd) => cmd.execute(&self.api).await,
            Commands::Update(cmd) => cmd.execute(&self.api).await,
            Commands::Info(cmd) => cmd.execute(&self.api).await,
        }
    }

    /// Wire the verbosity flags into tracing and progress rendering.
    ///
    /// An explicit `RUST_LOG` always wins over the flags.
    fn init_output(&self) {
        if self.no_progress || self.quiet {
            // SAFETY: set before any other thread is spawned.
            unsafe { std::env::set_var("SRVUP_NO_PROGRESS", "1") };
        }

        let default_directive = if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }
}
