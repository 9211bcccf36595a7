//! The `clone` command: run the tenant fan-out.

use crate::cli::GlobalOptions;
use crate::materializer::{CloneReport, Materializer};
use crate::project::{self, MasterProject};
use crate::registry::TenantRegistry;
use crate::utils::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON report
    Json,
}

/// Fan the master project out into tenant-scoped copies.
#[derive(Args)]
pub struct CloneCommand {
    /// Root directory containing the environment directories.
    ///
    /// Defaults to the current directory.
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Only process the named environment(s).
    ///
    /// May be repeated. Each name must still be discovered under the root
    /// and mapped in the registry.
    #[arg(short, long = "environment")]
    environments: Vec<String>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl CloneCommand {
    /// Execute the clone run.
    ///
    /// # Errors
    ///
    /// Fatal on registry problems, unmapped environments (checked before
    /// any file is processed), missing master projects, malformed schema
    /// documents, and I/O failures.
    pub fn execute(self, options: &GlobalOptions) -> Result<()> {
        let root = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let registry = TenantRegistry::load(&options.registry_path(&root))?;

        let environments = self.select_environments(&root)?;

        // Registry lookups and master-project location happen for every
        // environment before the first file is touched, so a configuration
        // hole can never leave a half-processed run behind.
        let mut plans = Vec::new();
        for environment in &environments {
            let name = environment_name(environment)?;
            let tenants = registry.tenants_for(name)?;
            let project = MasterProject::locate(environment, &registry.master_project)?;
            plans.push((project, tenants));
        }

        let mut report = CloneReport::default();
        for (project, tenants) in &plans {
            let environment_report =
                clone_environment(project, tenants, &registry, options)?;
            report.merge(environment_report);
        }

        self.render(&report, options)
    }

    /// Discover environments and apply any `--environment` filter.
    fn select_environments(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let discovered = project::discover_environments(root)?;

        if self.environments.is_empty() {
            if discovered.is_empty() {
                anyhow::bail!(
                    "no environment directories found under {} (expected names containing 'tenants')",
                    root.display()
                );
            }
            return Ok(discovered);
        }

        let mut selected = Vec::new();
        for wanted in &self.environments {
            let found = discovered
                .iter()
                .find(|path| path.file_name().is_some_and(|n| n == wanted.as_str()))
                .with_context(|| {
                    format!("environment '{wanted}' not found under {}", root.display())
                })?;
            selected.push(found.clone());
        }
        Ok(selected)
    }

    /// Print the run summary in the requested format.
    fn render(&self, report: &CloneReport, options: &GlobalOptions) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                if options.quiet {
                    return Ok(());
                }
                println!(
                    "{} {} tenant file(s), {} shared file(s)",
                    "✓".green(),
                    report.written,
                    report.shared
                );
                if !report.skipped.is_empty() {
                    println!(
                        "{} {} file(s) skipped (no transformer registered):",
                        "!".yellow(),
                        report.skipped.len()
                    );
                    for notice in &report.skipped {
                        println!(
                            "    {} ({}/{})",
                            notice.path, notice.tenant, notice.category
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Clone every (tenant, category) pair of one environment.
fn clone_environment(
    project: &MasterProject,
    tenants: &[String],
    registry: &TenantRegistry,
    options: &GlobalOptions,
) -> Result<CloneReport> {
    // Enumerate once per category; the same file list serves every tenant.
    let mut category_files = Vec::new();
    let mut total = 0u64;
    for &category in &registry.directories {
        let files = project.files(category)?;
        total += (files.len() * tenants.len()) as u64;
        category_files.push((category, files));
    }

    info!(
        environment = %project.environment().display(),
        tenants = tenants.len(),
        files = total,
        "cloning environment"
    );

    let progress = ProgressReporter::new(total, options.progress_enabled());
    let mut report = CloneReport::default();

    for tenant in tenants {
        for (category, files) in &category_files {
            let category_root = project.category_root(*category);
            let materializer =
                Materializer::new(project.environment(), &category_root, *category, tenant);

            for file in files {
                let outcome = materializer.materialize(file)?;
                let rel = materializer.relative_path(file)?;
                report.record(&outcome, tenant, *category, rel);
                progress.tick(format!("{tenant}/{category}"));
            }
        }
    }

    progress.finish();
    Ok(report)
}

/// The environment's directory name as UTF-8.
fn environment_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("environment directory has no usable name: {}", path.display()))
}
