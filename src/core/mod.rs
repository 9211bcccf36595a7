//! Core types for tenfold: error handling and resource classification.

pub mod error;
pub mod resource;

pub use error::{ErrorContext, TenfoldError, user_friendly_error};
pub use resource::{
    Classification, DestinationStrategy, ResourceCategory, TransformKind, classify, tenant_name,
};
