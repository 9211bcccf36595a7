//! Resource categories and file classification.
//!
//! The master project is organized into category subtrees (models, macros,
//! seeds, snapshots). Each file under a category is classified once into a
//! [`Classification`]: which content transform applies, where the output
//! lands relative to the tenant root, and whether the file is renamed with
//! the tenant prefix.
//!
//! Classification is a closed rule table over (file extension, category) -
//! a tagged-variant dispatch rather than open-ended polymorphism, so the
//! rules stay auditable and exhaustively matchable.
//!
//! # Rule Table
//!
//! | Extension | Category | Transform | Destination | Renamed |
//! |---|---|---|---|---|
//! | `.sql` | models/seeds/snapshots | Source | tenant-scoped | yes |
//! | `.sql` | macros | Share | shared, nested | no |
//! | `.yml`/`.yaml` | any | Schema | tenant-scoped | no |
//! | `.md` | any | Share | shared, flattened | no |
//! | other | any | none (recorded skip) | - | - |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Category subtrees of the master project that tenfold fans out.
///
/// Serialized in lowercase ("models", "macros", ...) for use in
/// `tenfold.toml` and JSON reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    /// Transformation models (templated SQL)
    Models,
    /// Tenant-agnostic macros, shared verbatim across tenants
    Macros,
    /// Seed data files
    Seeds,
    /// Snapshot definitions (templated SQL)
    Snapshots,
}

impl ResourceCategory {
    /// All categories, in the order they are fanned out.
    pub const ALL: [Self; 4] = [Self::Models, Self::Macros, Self::Seeds, Self::Snapshots];

    /// The subtree directory name for this category.
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Macros => "macros",
            Self::Seeds => "seeds",
            Self::Snapshots => "snapshots",
        }
    }

}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ResourceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "models" | "model" => Ok(Self::Models),
            "macros" | "macro" => Ok(Self::Macros),
            "seeds" | "seed" => Ok(Self::Seeds),
            "snapshots" | "snapshot" => Ok(Self::Snapshots),
            other => Err(format!("unknown resource category: {other}")),
        }
    }
}

/// Which content transformation applies to a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Templated SQL rewrite: configuration enforcement + reference prefixing
    Source,
    /// Structured YAML rewrite: model-like names and source schemas
    Schema,
    /// Verbatim copy, no content rewrite
    Share,
}

/// Where a classified file's output lands relative to the tenant root.
///
/// Selected once at classification time. Shared strategies exist because
/// macros and docs carry tenant-agnostic logic that every tenant can use
/// from a single copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationStrategy {
    /// `<category>/<tenant>/<relative path>` - one copy per tenant
    TenantScoped,
    /// `<category>/<relative path>` - single copy, original nesting kept
    SharedNested,
    /// `<category>/shared/<file name>` - single copy, sub-path flattened
    SharedFlattened,
}

/// The outcome of classifying one file: transform, placement, rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Content transformation to apply
    pub transform: TransformKind,
    /// Destination placement strategy
    pub destination: DestinationStrategy,
    /// Whether the output file name gets the tenant prefix
    pub renames: bool,
}

/// Classify a file by extension and containing category.
///
/// Returns `None` for extensions with no registered transformer; callers
/// must record the skip (it is a notice, not an error).
///
/// # Examples
///
/// ```rust
/// use tenfold::core::resource::{classify, ResourceCategory, TransformKind};
/// use std::path::Path;
///
/// let c = classify(Path::new("orders.sql"), ResourceCategory::Models).unwrap();
/// assert_eq!(c.transform, TransformKind::Source);
/// assert!(c.renames);
///
/// assert!(classify(Path::new("notes.txt"), ResourceCategory::Models).is_none());
/// ```
#[must_use]
pub fn classify(path: &Path, category: ResourceCategory) -> Option<Classification> {
    let extension = path.extension().and_then(|e| e.to_str())?;

    match extension.to_lowercase().as_str() {
        "sql" => match category {
            ResourceCategory::Models | ResourceCategory::Seeds | ResourceCategory::Snapshots => {
                Some(Classification {
                    transform: TransformKind::Source,
                    destination: DestinationStrategy::TenantScoped,
                    renames: true,
                })
            }
            ResourceCategory::Macros => Some(Classification {
                transform: TransformKind::Share,
                destination: DestinationStrategy::SharedNested,
                renames: false,
            }),
        },
        // Structured documents always take the schema transform, whatever
        // category subtree they sit in.
        "yml" | "yaml" => Some(Classification {
            transform: TransformKind::Schema,
            destination: DestinationStrategy::TenantScoped,
            renames: false,
        }),
        "md" => Some(Classification {
            transform: TransformKind::Share,
            destination: DestinationStrategy::SharedFlattened,
            renames: false,
        }),
        _ => None,
    }
}

/// Rewritten name for a tenant-owned resource: `{tenant}_{name}`.
///
/// Deterministic and injective for a fixed tenant, which is what keeps
/// re-runs idempotent and names collision-free in a shared catalog.
#[must_use]
pub fn tenant_name(tenant: &str, name: &str) -> String {
    format!("{tenant}_{name}")
}
