//! srvup CLI entry point.
//!
//! Parses the command line, runs the selected command on a current-thread
//! runtime (the pipeline is strictly sequential), and renders failures with
//! user-friendly context before exiting non-zero.

use clap::Parser;
use srvup::cli::Cli;
use srvup::core::user_friendly_error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(error) = cli.execute().await {
        user_friendly_error(&error).display();
        std::process::exit(1);
    }
}
