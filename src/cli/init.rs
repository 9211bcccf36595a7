//! The `init` command: scaffold a starter registry file.

use crate::cli::GlobalOptions;
use crate::registry::REGISTRY_FILE;
use crate::utils::fs::{ensure_dir, safe_write};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

const REGISTRY_TEMPLATE: &str = r#"# tenfold tenant registry
#
# Maps each environment directory (a sibling of this file whose name
# contains 'tenants') to the ordered list of customers active in it.

# Name of the master project directory under dbt_packages/.
# master-project = "master_project"

# Categories to fan out. Defaults to all of them.
# directories = ["models", "macros", "seeds", "snapshots"]

[environments]
# tenants_env1 = ["cust1", "cust2"]
"#;

/// Create a starter tenfold.toml registry.
#[derive(Args)]
pub struct InitCommand {
    /// Directory to create the registry in (defaults to the current
    /// directory; created if missing).
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Overwrite an existing registry file.
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    /// Write the registry template.
    ///
    /// # Errors
    ///
    /// Fails if the registry already exists and `--force` was not given, or
    /// on I/O failure.
    pub fn execute(self, options: &GlobalOptions) -> Result<()> {
        let dir = self.path.unwrap_or_else(|| PathBuf::from("."));
        ensure_dir(&dir)?;
        let target = dir.join(REGISTRY_FILE);

        if target.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                target.display()
            );
        }

        safe_write(&target, REGISTRY_TEMPLATE)?;

        if !options.quiet {
            println!("{} Created {}", "✓".green(), target.display());
            println!("\n{}", "Next steps:".cyan());
            println!("  Fill in [environments] with your tenant mapping");
            println!("  Then run {} to check the layout", "tenfold validate".bright_white());
            println!("  And {} to fan out the project", "tenfold clone".bright_white());
        }
        Ok(())
    }
}
