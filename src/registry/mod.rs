//! Tenant registry parsing and validation.
//!
//! The registry (`tenfold.toml`) is the per-run configuration mapping each
//! deployment environment directory to the ordered list of customers active
//! in it. It is an explicit input loaded at startup - never a compiled-in
//! constant - so runs can be pointed at alternative registries for testing
//! or staged rollouts.
//!
//! # Format
//!
//! ```toml
//! master-project = "master_project"
//! directories = ["models", "macros"]
//!
//! [environments]
//! tenants_env1 = ["cust1", "cust2", "cust3"]
//! tenants_env2 = ["cust4"]
//! ```
//!
//! `master-project` and `directories` are optional; they default to
//! `master_project` and all four categories. The lookup
//! [`TenantRegistry::tenants_for`] is total over mapped environments and a
//! missing mapping is a fatal configuration error raised before any file
//! processing for that environment.

use crate::core::{ResourceCategory, TenfoldError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Default master project directory name under `dbt_packages/`.
pub const DEFAULT_MASTER_PROJECT: &str = "master_project";

/// Registry file name searched for next to the fan-out root.
pub const REGISTRY_FILE: &str = "tenfold.toml";

/// The tenant registry: environments, their customers, and fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantRegistry {
    /// Name of the master project directory under `dbt_packages/`.
    #[serde(
        rename = "master-project",
        default = "default_master_project",
        skip_serializing_if = "is_default_master"
    )]
    pub master_project: String,

    /// Categories to fan out, in order. Defaults to all of them.
    #[serde(default = "default_directories")]
    pub directories: Vec<ResourceCategory>,

    /// Environment directory name to ordered customer list.
    ///
    /// `BTreeMap` keeps environment iteration deterministic; each customer
    /// list keeps its declared order.
    pub environments: BTreeMap<String, Vec<String>>,
}

fn default_master_project() -> String {
    DEFAULT_MASTER_PROJECT.to_string()
}

fn is_default_master(name: &String) -> bool {
    name == DEFAULT_MASTER_PROJECT
}

fn default_directories() -> Vec<ResourceCategory> {
    ResourceCategory::ALL.to_vec()
}

impl TenantRegistry {
    /// Load and validate a registry from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`TenfoldError::RegistryNotFound`] when the file does not exist
    /// - [`TenfoldError::RegistryParseError`] on invalid TOML
    /// - [`TenfoldError::RegistryValidationError`] on invalid contents
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TenfoldError::RegistryNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tenant registry: {}", path.display()))?;

        let registry: Self =
            toml::from_str(&content).map_err(|e| TenfoldError::RegistryParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        registry.validate()?;
        debug!(
            environments = registry.environments.len(),
            master = %registry.master_project,
            "loaded tenant registry"
        );
        Ok(registry)
    }

    /// Check registry contents beyond TOML well-formedness.
    ///
    /// # Errors
    ///
    /// Returns [`TenfoldError::RegistryValidationError`] naming the first
    /// problem found: empty environment set, empty or duplicated customer
    /// lists, or customer ids unusable as name prefixes.
    pub fn validate(&self) -> Result<()> {
        if self.environments.is_empty() {
            return Err(validation_error("no environments defined"));
        }

        for (environment, customers) in &self.environments {
            if environment.trim().is_empty() {
                return Err(validation_error("environment with empty name"));
            }
            if customers.is_empty() {
                return Err(validation_error(format!(
                    "environment '{environment}' has no customers"
                )));
            }

            let mut seen = std::collections::HashSet::new();
            for customer in customers {
                if !is_valid_customer_id(customer) {
                    return Err(validation_error(format!(
                        "customer '{customer}' in '{environment}' is not usable as a name \
                         prefix (use lowercase alphanumerics and underscores, starting with \
                         a letter)"
                    )));
                }
                if !seen.insert(customer.as_str()) {
                    return Err(validation_error(format!(
                        "customer '{customer}' listed twice for '{environment}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// The ordered customer list for an environment.
    ///
    /// # Errors
    ///
    /// Returns [`TenfoldError::EnvironmentNotMapped`] when the environment
    /// has no entry; the error context carries a nearest-name suggestion
    /// when a plausible near-miss exists.
    pub fn tenants_for(&self, environment: &str) -> Result<&[String]> {
        if let Some(customers) = self.environments.get(environment) {
            return Ok(customers);
        }

        let base_error = TenfoldError::EnvironmentNotMapped {
            environment: environment.to_string(),
        };

        match self.closest_environment(environment) {
            Some(candidate) => Err(anyhow::Error::from(base_error)
                .context(format!("did you mean '{candidate}'?"))),
            None => Err(base_error.into()),
        }
    }

    /// Nearest mapped environment name by edit-distance similarity.
    fn closest_environment(&self, environment: &str) -> Option<&str> {
        self.environments
            .keys()
            .map(|known| (known, strsim::jaro_winkler(environment, known)))
            .filter(|(_, score)| *score > 0.85)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(known, _)| known.as_str())
    }
}

fn validation_error(reason: impl Into<String>) -> anyhow::Error {
    TenfoldError::RegistryValidationError {
        reason: reason.into(),
    }
    .into()
}

/// A customer id must survive being spliced into resource names and schema
/// identifiers unquoted.
fn is_valid_customer_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
