//! Command-line interface for tenfold.
//!
//! Each subcommand lives in its own module with its own argument struct and
//! `execute()` method:
//!
//! - `clone` - fan the master project out into tenant copies
//! - `validate` - check registry coverage and layout without writing
//! - `init` - scaffold a starter `tenfold.toml`
//!
//! Global flags (`--verbose`, `--quiet`, `--config`, `--no-progress`) apply
//! to every subcommand. Verbosity controls the tracing filter; progress
//! bars are suppressed with `--quiet`/`--no-progress` and in non-TTY
//! environments.

mod clone;
mod init;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main CLI structure for tenfold.
#[derive(Parser)]
#[command(
    name = "tenfold",
    about = "Fan a master dbt-style project out into tenant-scoped copies",
    version,
    long_about = "tenfold clones a master data-transformation project once per tenant, \
                  renaming tenant-owned resources, rewriting cross-references, and \
                  sharing tenant-agnostic macros and docs."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug-level tracing).
    ///
    /// Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the tenant registry file.
    ///
    /// Defaults to `tenfold.toml` under the fan-out root.
    #[arg(short, long, global = true, env = "TENFOLD_CONFIG")]
    config: Option<PathBuf>,

    /// Disable progress bars for automation-friendly output.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Fan the master project out into tenant-scoped copies.
    ///
    /// Discovers environment directories under the root, looks each one up
    /// in the registry, and materializes every tenant copy. Safe to re-run:
    /// the pipeline is idempotent and overwrites prior output.
    Clone(clone::CloneCommand),

    /// Validate registry coverage and project layout without writing.
    Validate(validate::ValidateCommand),

    /// Create a starter tenfold.toml registry.
    Init(init::InitCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Propagates the subcommand's failure for top-level display.
    pub fn execute(self) -> Result<()> {
        self.init_tracing();

        let options = GlobalOptions {
            config: self.config,
            quiet: self.quiet,
            no_progress: self.no_progress,
        };

        match self.command {
            Commands::Clone(cmd) => cmd.execute(&options),
            Commands::Validate(cmd) => cmd.execute(&options),
            Commands::Init(cmd) => cmd.execute(&options),
        }
    }

    /// Install the tracing subscriber once, honoring verbosity flags.
    ///
    /// `RUST_LOG` still wins when set and neither flag is given.
    fn init_tracing(&self) {
        let filter = if self.verbose {
            EnvFilter::new("tenfold=debug")
        } else if self.quiet {
            EnvFilter::new("tenfold=error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenfold=warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Global flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Explicit registry path, when given.
    pub config: Option<PathBuf>,
    /// Suppress informational output.
    pub quiet: bool,
    /// Suppress progress bars.
    pub no_progress: bool,
}

impl GlobalOptions {
    /// Resolve the registry path for a given fan-out root.
    #[must_use]
    pub fn registry_path(&self, root: &std::path::Path) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| root.join(crate::registry::REGISTRY_FILE))
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_registry_path_defaults_next_to_root() {
        let options = GlobalOptions {
            config: None,
            quiet: false,
            no_progress: false,
        };
        assert_eq!(
            options.registry_path(std::path::Path::new("/data")),
            PathBuf::from("/data/tenfold.toml")
        );
    }

    #[test]
    fn test_explicit_config_wins() {
        let options = GlobalOptions {
            config: Some(PathBuf::from("/etc/tenfold/prod.toml")),
            quiet: false,
            no_progress: false,
        };
        assert_eq!(
            options.registry_path(std::path::Path::new("/data")),
            PathBuf::from("/etc/tenfold/prod.toml")
        );
    }

    #[test]
    fn test_quiet_disables_progress() {
        let options = GlobalOptions {
            config: None,
            quiet: true,
            no_progress: false,
        };
        assert!(!options.progress_enabled());
    }
}
