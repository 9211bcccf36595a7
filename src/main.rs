//! tenfold CLI entry point.
//!
//! Parses arguments, executes the command, and renders failures as
//! user-friendly errors with suggestions.

use anyhow::Result;
use clap::Parser;
use tenfold::cli;
use tenfold::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
