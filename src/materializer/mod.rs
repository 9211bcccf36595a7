//! File materialization: classify, transform, place, write.
//!
//! The materializer drives a single master-project file through the
//! pipeline for one tenant: classification picks the transform and
//! destination strategy, the content is rewritten (or copied verbatim),
//! the destination path is computed as a pure function of (category,
//! tenant, relative path), and the result is written atomically.
//!
//! Files with no registered transformer are recorded as skips - a notice,
//! never an error. Everything else that fails (unreadable source, malformed
//! schema document, failed write) is fatal and names the offending path, so
//! a re-run can target exactly the failed set. No destination outside the
//! computed path is ever touched, and no two (tenant, file) pairs share a
//! destination, which is what makes re-runs safe and order-free.

use crate::core::resource::{classify, tenant_name};
use crate::core::{Classification, DestinationStrategy, ResourceCategory, TransformKind};
use crate::transform::{SourceTransformer, schema};
use crate::utils::fs::{atomic_write, ensure_dir, read_text};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of materializing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was transformed (or copied) and written to `dest`.
    Written {
        /// Destination the file landed at
        dest: PathBuf,
        /// Whether the destination is shared across tenants
        shared: bool,
    },
    /// The file has no registered transformer and was skipped.
    Skipped {
        /// Source file that was skipped
        path: PathBuf,
    },
}

/// A recorded skip notice: the file and the tenant/category context it was
/// encountered in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkipNotice {
    /// Tenant being processed when the file was seen
    pub tenant: String,
    /// Category subtree the file sits in
    pub category: ResourceCategory,
    /// Path relative to the category root
    pub path: String,
}

/// Aggregated result of a clone run, serializable for `--format json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloneReport {
    /// Tenant-scoped files written
    pub written: usize,
    /// Shared files written (macros, docs)
    pub shared: usize,
    /// Skip notices, in encounter order
    pub skipped: Vec<SkipNotice>,
}

impl CloneReport {
    /// Fold one outcome into the totals.
    pub fn record(&mut self, outcome: &Outcome, tenant: &str, category: ResourceCategory, rel: &Path) {
        match outcome {
            Outcome::Written { shared: true, .. } => self.shared += 1,
            Outcome::Written { shared: false, .. } => self.written += 1,
            Outcome::Skipped { .. } => self.skipped.push(SkipNotice {
                tenant: tenant.to_string(),
                category,
                path: rel.display().to_string(),
            }),
        }
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: CloneReport) {
        self.written += other.written;
        self.shared += other.shared;
        self.skipped.extend(other.skipped);
    }
}

/// Materializes master-project files for one (tenant, category) pair.
#[derive(Debug)]
pub struct Materializer<'a> {
    /// Environment directory the tenant copies land under
    environment: &'a Path,
    /// Root of the master project's category subtree
    category_root: &'a Path,
    category: ResourceCategory,
    tenant: &'a str,
}

impl<'a> Materializer<'a> {
    /// Create a materializer for one (tenant, category) pair.
    #[must_use]
    pub fn new(
        environment: &'a Path,
        category_root: &'a Path,
        category: ResourceCategory,
        tenant: &'a str,
    ) -> Self {
        Self {
            environment,
            category_root,
            category,
            tenant,
        }
    }

    /// Drive one file through classify, transform, place, write.
    ///
    /// # Errors
    ///
    /// Fatal on unreadable sources, malformed schema documents, and
    /// directory-creation or write failures; the error names the tenant,
    /// category, and file.
    pub fn materialize(&self, file: &Path) -> Result<Outcome> {
        self.materialize_inner(file).with_context(|| {
            format!(
                "failed materializing tenant '{}', category '{}', file {}",
                self.tenant,
                self.category,
                file.display()
            )
        })
    }

    fn materialize_inner(&self, file: &Path) -> Result<Outcome> {
        let Some(classification) = classify(file, self.category) else {
            warn!(
                tenant = self.tenant,
                category = %self.category,
                file = %file.display(),
                "no transformer registered, skipping"
            );
            return Ok(Outcome::Skipped {
                path: file.to_path_buf(),
            });
        };

        let dest = self.destination(file, &classification)?;
        let shared = classification.destination != DestinationStrategy::TenantScoped;

        // Shared destinations are written once per run but every tenant pass
        // recomputes the same bytes, so later passes just overwrite with
        // identical content.
        let content = self.transformed_content(file, &classification)?;

        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        atomic_write(&dest, &content)?;
        debug!(
            tenant = self.tenant,
            from = %file.display(),
            to = %dest.display(),
            "materialized"
        );

        Ok(Outcome::Written { dest, shared })
    }

    /// Relative path of a file within the category subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not under the category root.
    pub fn relative_path<'f>(&self, file: &'f Path) -> Result<&'f Path> {
        file.strip_prefix(self.category_root).with_context(|| {
            format!(
                "{} is not under category root {}",
                file.display(),
                self.category_root.display()
            )
        })
    }

    /// Compute the destination path for a classified file.
    ///
    /// Pure in (category, tenant, relative path, strategy); no filesystem
    /// access.
    fn destination(&self, file: &Path, classification: &Classification) -> Result<PathBuf> {
        let rel = self.relative_path(file)?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("File has no usable name: {}", file.display()))?;

        let out_name = if classification.renames {
            tenant_name(self.tenant, file_name)
        } else {
            file_name.to_string()
        };

        let category_dir = self.environment.join(self.category.dir_name());
        let dest = match classification.destination {
            DestinationStrategy::TenantScoped => {
                let mut dir = category_dir.join(self.tenant);
                if let Some(parent) = rel.parent() {
                    dir = dir.join(parent);
                }
                dir.join(out_name)
            }
            DestinationStrategy::SharedNested => {
                let mut dir = category_dir;
                if let Some(parent) = rel.parent() {
                    dir = dir.join(parent);
                }
                dir.join(out_name)
            }
            DestinationStrategy::SharedFlattened => category_dir.join("shared").join(out_name),
        };

        Ok(dest)
    }

    /// Produce the output bytes for a classified file.
    fn transformed_content(&self, file: &Path, classification: &Classification) -> Result<Vec<u8>> {
        let text = read_text(file)?;

        let out = match classification.transform {
            TransformKind::Source => {
                let stem = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .with_context(|| format!("File has no usable stem: {}", file.display()))?;
                SourceTransformer::new(self.tenant, stem)?.transform(&text)
            }
            TransformKind::Schema => {
                let rel = self.relative_path(file)?;
                schema::transform_text(&text, self.tenant, &rel.display().to_string())?
            }
            TransformKind::Share => text,
        };

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct Fixture {
        _temp: tempfile::TempDir,
        environment: PathBuf,
        category_root: PathBuf,
    }

    fn fixture(category: ResourceCategory) -> Fixture {
        let temp = tempdir().unwrap();
        let environment = temp.path().join("tenants_env1");
        let category_root = environment
            .join("dbt_packages/master_project")
            .join(category.dir_name());
        fs::create_dir_all(&category_root).unwrap();
        Fixture {
            _temp: temp,
            environment,
            category_root,
        }
    }

    #[test]
    fn test_model_renamed_transformed_tenant_scoped() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("orders.sql");
        fs::write(&source, "select * from {{ ref('customers') }}").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();

        let expected = fx.environment.join("models/acme/acme_orders.sql");
        assert_eq!(
            outcome,
            Outcome::Written {
                dest: expected.clone(),
                shared: false
            }
        );
        let written = fs::read_to_string(expected).unwrap();
        assert!(written.starts_with("{{ config(schema='acme', alias='orders') }}\n\n"));
        assert!(written.contains("{{ ref('acme_customers') }}"));
    }

    #[test]
    fn test_nested_model_keeps_sub_path() {
        let fx = fixture(ResourceCategory::Models);
        let staging = fx.category_root.join("staging");
        fs::create_dir_all(&staging).unwrap();
        let source = staging.join("stg_orders.sql");
        fs::write(&source, "select 1").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();
        assert_eq!(
            outcome,
            Outcome::Written {
                dest: fx.environment.join("models/acme/staging/acme_stg_orders.sql"),
                shared: false
            }
        );
    }

    #[test]
    fn test_macro_shared_nested_verbatim() {
        let fx = fixture(ResourceCategory::Macros);
        let util = fx.category_root.join("util");
        fs::create_dir_all(&util).unwrap();
        let source = util.join("cents.sql");
        let body = "{% macro cents(col) %}{{ col }} / 100{% endmacro %}";
        fs::write(&source, body).unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Macros,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();

        let expected = fx.environment.join("macros/util/cents.sql");
        assert_eq!(
            outcome,
            Outcome::Written {
                dest: expected.clone(),
                shared: true
            }
        );
        // Shared verbatim: no rename, no config injection, no ref rewrite
        assert_eq!(fs::read_to_string(expected).unwrap(), body);
    }

    #[test]
    fn test_doc_shared_flattened() {
        let fx = fixture(ResourceCategory::Models);
        let deep = fx.category_root.join("overview/finance");
        fs::create_dir_all(&deep).unwrap();
        let source = deep.join("orders.md");
        fs::write(&source, "# Orders\n").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();
        assert_eq!(
            outcome,
            Outcome::Written {
                dest: fx.environment.join("models/shared/orders.md"),
                shared: true
            }
        );
    }

    #[test]
    fn test_schema_document_tenant_scoped_unrenamed() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("schema.yml");
        fs::write(&source, "models:\n- name: orders\n").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();

        let expected = fx.environment.join("models/acme/schema.yml");
        assert_eq!(
            outcome,
            Outcome::Written {
                dest: expected.clone(),
                shared: false
            }
        );
        assert!(fs::read_to_string(expected).unwrap().contains("acme_orders"));
    }

    #[test]
    fn test_unsupported_extension_skipped_not_fatal() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("notes.txt");
        fs::write(&source, "remember the milk").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let outcome = materializer.materialize(&source).unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped {
                path: source.clone()
            }
        );
        // Nothing written anywhere for the skipped file
        assert!(!fx.environment.join("models/acme").exists());
    }

    #[test]
    fn test_malformed_schema_is_fatal_and_names_file() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("schema.yml");
        fs::write(&source, "models:\n  - name: [unclosed").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        let err = materializer.materialize(&source).unwrap_err();
        assert!(err.to_string().contains("schema.yml"));
    }

    #[test]
    fn test_rerun_converges() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("orders.sql");
        fs::write(&source, "select * from {{ ref('customers') }}").unwrap();

        let materializer = Materializer::new(
            &fx.environment,
            &fx.category_root,
            ResourceCategory::Models,
            "acme",
        );
        materializer.materialize(&source).unwrap();
        let dest = fx.environment.join("models/acme/acme_orders.sql");
        let first = fs::read_to_string(&dest).unwrap();
        materializer.materialize(&source).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), first);
    }

    #[test]
    fn test_two_tenants_never_share_tenant_scoped_paths() {
        let fx = fixture(ResourceCategory::Models);
        let source = fx.category_root.join("orders.sql");
        fs::write(&source, "select 1").unwrap();

        for tenant in ["acme", "globex"] {
            Materializer::new(
                &fx.environment,
                &fx.category_root,
                ResourceCategory::Models,
                tenant,
            )
            .materialize(&source)
            .unwrap();
        }

        assert!(fx.environment.join("models/acme/acme_orders.sql").exists());
        assert!(fx.environment.join("models/globex/globex_orders.sql").exists());
    }

    #[test]
    fn test_report_counts_and_notices() {
        let mut report = CloneReport::default();
        report.record(
            &Outcome::Written {
                dest: PathBuf::from("x"),
                shared: false,
            },
            "acme",
            ResourceCategory::Models,
            Path::new("orders.sql"),
        );
        report.record(
            &Outcome::Written {
                dest: PathBuf::from("y"),
                shared: true,
            },
            "acme",
            ResourceCategory::Macros,
            Path::new("cents.sql"),
        );
        report.record(
            &Outcome::Skipped {
                path: PathBuf::from("notes.txt"),
            },
            "acme",
            ResourceCategory::Models,
            Path::new("notes.txt"),
        );

        assert_eq!(report.written, 1);
        assert_eq!(report.shared, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "notes.txt");
    }
}
