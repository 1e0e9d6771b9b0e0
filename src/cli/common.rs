//! Argument groups shared by the CLI commands.

use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::StateStore;
use crate::select::Selector;
use crate::updater::StateOverrides;

/// The install target.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Path to the server binary, or the directory to install it into.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Where the installed-state record lives and how to override it.
#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    /// Path to the state record (defaults to version_history.json next to
    /// the target).
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Do not read or write the state record.
    #[arg(long)]
    pub no_state: bool,

    /// Treat this as the installed version, ignoring the record.
    #[arg(long, value_name = "VERSION")]
    pub installed_version: Option<String>,

    /// Treat this as the installed build, ignoring the record.
    #[arg(long, value_name = "BUILD")]
    pub installed_build: Option<i64>,
}

impl StateArgs {
    /// Build the state store for `target`, unless the record is disabled.
    pub fn store(&self, target: &Path) -> Option<StateStore> {
        if self.no_state {
            return None;
        }
        Some(match &self.state_file {
            Some(path) => StateStore::new(path),
            None => StateStore::for_target(target),
        })
    }

    /// The CLI overrides of the loaded state.
    pub fn overrides(&self) -> StateOverrides {
        StateOverrides {
            version: self.installed_version.clone(),
            build: self.installed_build,
        }
    }
}

/// Default version and build selectors.
#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Version to install: a literal, 'latest', or 'current'.
    #[arg(short = 'v', long, value_name = "SELECTOR", default_value = "latest")]
    pub version: Selector,

    /// Build to install: a number, 'latest', or 'current'.
    #[arg(short = 'b', long, value_name = "SELECTOR", default_value = "latest")]
    pub build: Selector,
}
