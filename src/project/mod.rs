//! Master project layout and environment discovery.
//!
//! The on-disk layout tenfold operates on:
//!
//! ```text
//! <root>/
//!   tenfold.toml
//!   tenants_env1/
//!     dbt_packages/
//!       master_project/
//!         models/...
//!         macros/...
//!   tenants_env2/
//!     ...
//! ```
//!
//! Environment directories are the immediate subdirectories of the root
//! whose name contains `tenants`. Under each, the master project's category
//! subtrees are walked recursively; all non-directory entries are handed to
//! the materializer, which decides what (if anything) to do with each.

use crate::core::{ResourceCategory, TenfoldError};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Marker substring identifying environment directories.
const ENVIRONMENT_MARKER: &str = "tenants";

/// Discover environment directories under a root path.
///
/// Returns the sorted list of immediate subdirectories whose name contains
/// the `tenants` marker. Sorting keeps run order deterministic.
///
/// # Errors
///
/// Returns an error if the root cannot be read.
pub fn discover_environments(root: &Path) -> Result<Vec<PathBuf>> {
    let mut environments = Vec::new();

    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to read root directory: {}", root.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry under {}", root.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.contains(ENVIRONMENT_MARKER) {
            environments.push(path);
        }
    }

    environments.sort();
    debug!(count = environments.len(), root = %root.display(), "discovered environments");
    Ok(environments)
}

/// The master project subtree inside one environment directory.
#[derive(Debug, Clone)]
pub struct MasterProject {
    environment: PathBuf,
    name: String,
}

impl MasterProject {
    /// Locate the master project under an environment directory.
    ///
    /// # Errors
    ///
    /// Returns [`TenfoldError::MasterProjectNotFound`] when
    /// `dbt_packages/<name>` does not exist under the environment.
    pub fn locate(environment: &Path, name: &str) -> Result<Self> {
        let project = Self {
            environment: environment.to_path_buf(),
            name: name.to_string(),
        };
        if !project.root().is_dir() {
            return Err(TenfoldError::MasterProjectNotFound {
                name: name.to_string(),
                path: environment.display().to_string(),
            }
            .into());
        }
        Ok(project)
    }

    /// The environment directory this project belongs to.
    #[must_use]
    pub fn environment(&self) -> &Path {
        &self.environment
    }

    /// `<environment>/dbt_packages/<name>`
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.environment.join("dbt_packages").join(&self.name)
    }

    /// `<environment>/dbt_packages/<name>/<category>`
    #[must_use]
    pub fn category_root(&self, category: ResourceCategory) -> PathBuf {
        self.root().join(category.dir_name())
    }

    /// All files under a category subtree, sorted, recursive.
    ///
    /// A category directory that does not exist yields an empty list - a
    /// master project is not required to populate every category. Symlinks
    /// are not followed.
    ///
    /// # Errors
    ///
    /// Returns an error if traversal fails below an existing category root.
    pub fn files(&self, category: ResourceCategory) -> Result<Vec<PathBuf>> {
        let root = self.category_root(category);
        if !root.is_dir() {
            trace!(category = %category, "category absent from master project");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = entry
                .with_context(|| format!("Failed to walk category tree: {}", root.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}
