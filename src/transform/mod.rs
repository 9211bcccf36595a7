//! Content transformers for tenant cloning.
//!
//! Three transformations exist, selected by classification
//! ([`crate::core::resource::classify`]):
//!
//! - [`source`] - templated SQL: configuration enforcement and reference
//!   rewriting for models, seeds, and snapshots
//! - [`schema`] - structured YAML: resource renaming and source-schema
//!   rebinding
//! - verbatim sharing, which needs no module of its own
//!
//! [`matcher`] holds the pattern utilities the source transformer is built
//! on.

pub mod matcher;
pub mod schema;
pub mod source;

pub use matcher::ReferenceMatcher;
pub use source::SourceTransformer;
