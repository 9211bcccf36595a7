//! The `validate` command: check configuration and layout without writing.

use crate::cli::GlobalOptions;
use crate::project::{self, MasterProject};
use crate::registry::TenantRegistry;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Validate registry coverage and project layout.
///
/// Checks, in order: the registry loads and passes validation; every
/// discovered environment directory has a registry mapping; every mapped
/// environment that exists on disk contains the master project subtree.
/// Problems are collected and reported together rather than stopping at the
/// first, since this command exists to survey a deployment before a run.
#[derive(Args)]
pub struct ValidateCommand {
    /// Root directory containing the environment directories.
    #[arg(short, long)]
    path: Option<PathBuf>,
}

impl ValidateCommand {
    /// Execute the validation checks.
    ///
    /// # Errors
    ///
    /// Returns an error when the registry itself is unusable, or when any
    /// coverage or layout problem was found.
    pub fn execute(self, options: &GlobalOptions) -> Result<()> {
        let root = self.path.unwrap_or_else(|| PathBuf::from("."));
        let registry = TenantRegistry::load(&options.registry_path(&root))?;

        let environments = project::discover_environments(&root)?;
        let mut problems = Vec::new();

        for environment in &environments {
            let Some(name) = environment.file_name().and_then(|n| n.to_str()) else {
                problems.push(format!(
                    "environment directory has no usable name: {}",
                    environment.display()
                ));
                continue;
            };

            if let Err(err) = registry.tenants_for(name) {
                problems.push(format!("{err:#}"));
                continue;
            }

            if let Err(err) = MasterProject::locate(environment, &registry.master_project) {
                problems.push(format!("{err:#}"));
            }
        }

        for mapped in registry.environments.keys() {
            if !environments.iter().any(|p| p.file_name().is_some_and(|n| n == mapped.as_str())) {
                problems.push(format!(
                    "registry maps '{mapped}' but no such directory exists under {}",
                    root.display()
                ));
            }
        }

        if problems.is_empty() {
            if !options.quiet {
                println!(
                    "{} {} environment(s) mapped and laid out correctly",
                    "✓".green(),
                    environments.len()
                );
            }
            return Ok(());
        }

        for problem in &problems {
            eprintln!("{} {}", "✗".red(), problem);
        }
        anyhow::bail!("validation found {} problem(s)", problems.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options() -> GlobalOptions {
        GlobalOptions {
            config: None,
            quiet: true,
            no_progress: true,
        }
    }

    #[test]
    fn test_validate_passes_on_consistent_layout() {
        let temp = tempdir().unwrap();
        let env = temp.path().join("tenants_env1");
        fs::create_dir_all(env.join("dbt_packages/master_project/models")).unwrap();
        fs::write(
            temp.path().join("tenfold.toml"),
            "[environments]\ntenants_env1 = [\"cust1\"]\n",
        )
        .unwrap();

        let cmd = ValidateCommand {
            path: Some(temp.path().to_path_buf()),
        };
        assert!(cmd.execute(&options()).is_ok());
    }

    #[test]
    fn test_validate_flags_unmapped_environment() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("tenants_env1/dbt_packages/master_project")).unwrap();
        fs::create_dir_all(temp.path().join("tenants_env2/dbt_packages/master_project")).unwrap();
        fs::write(
            temp.path().join("tenfold.toml"),
            "[environments]\ntenants_env1 = [\"cust1\"]\n",
        )
        .unwrap();

        let cmd = ValidateCommand {
            path: Some(temp.path().to_path_buf()),
        };
        let err = cmd.execute(&options()).unwrap_err();
        assert!(err.to_string().contains("1 problem"));
    }

    #[test]
    fn test_validate_flags_stale_registry_entry() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("tenfold.toml"),
            "[environments]\ntenants_gone = [\"cust1\"]\n",
        )
        .unwrap();

        let cmd = ValidateCommand {
            path: Some(temp.path().to_path_buf()),
        };
        assert!(cmd.execute(&options()).is_err());
    }
}
