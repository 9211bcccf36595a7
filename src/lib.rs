//! tenfold - tenant fan-out for a master dbt-style project
//!
//! tenfold multiplies a single canonical data-transformation project (the
//! "master project": models, macros, seeds, snapshots, schema and doc
//! files) into per-tenant copies without duplicating shared logic. For each
//! tenant it:
//!
//! - renames every tenant-owned resource with the customer prefix, so names
//!   never collide across tenants in a shared catalog
//! - rewrites every internal cross-reference to point at the renamed,
//!   tenant-scoped resource
//! - injects (or augments) the mandatory per-resource configuration block
//!   binding the resource to the tenant's schema and its own alias
//! - shares macros and docs verbatim, since their logic is tenant-agnostic
//!
//! # Architecture
//!
//! The pipeline is a synchronous classify → transform → place → write loop.
//! Every transformation is a pure function of (source content, tenant,
//! resource stem), so re-runs are idempotent and convergent; no two
//! materializations write the same destination, so there is nothing to
//! lock.
//!
//! # Core Modules
//!
//! - [`core`] - error types and the classification rule table
//! - [`registry`] - the tenant registry (`tenfold.toml`): environments and
//!   their customers
//! - [`transform`] - the content transformers (templated SQL, structured
//!   YAML) and the pattern matcher under them
//! - [`project`] - environment discovery and master-project traversal
//! - [`materializer`] - drives one file through the pipeline and reports
//!   outcomes
//! - [`cli`] - the `clone`, `validate`, and `init` commands
//! - [`utils`] - file system helpers and progress reporting
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   tenfold.toml                # the tenant registry
//!   tenants_env1/
//!     dbt_packages/master_project/
//!       models/orders.sql       # input
//!     models/acme/acme_orders.sql   # tenant-scoped output
//!     macros/cents.sql              # shared output
//!     models/shared/orders.md       # shared, flattened docs
//! ```

pub mod cli;
pub mod core;
pub mod materializer;
pub mod project;
pub mod registry;
pub mod transform;
pub mod utils;
