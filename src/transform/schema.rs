//! Structured schema-document transformation.
//!
//! Schema documents are YAML mappings describing resources. Two families of
//! top-level keys matter here:
//!
//! - `models` / `seeds` / `snapshots` list tenant-owned resources; every
//!   item's `name` is rewritten with the tenant prefix to match the renamed
//!   resource files.
//! - `sources` lists externally-owned tables; each entry's `schema` is
//!   pointed at the tenant, while its `name` stays untouched (a source table
//!   is not a tenant-renamed resource).
//!
//! The transform is pure: the input document is never mutated. Key order is
//! preserved through parse and serialize so tenant copies diff cleanly
//! against the master.

use crate::core::resource::tenant_name;
use crate::core::TenfoldError;
use anyhow::Result;
use serde_yaml::Value;

/// Top-level keys whose items are tenant-owned and get renamed.
const RESOURCE_KEYS: [&str; 3] = ["models", "seeds", "snapshots"];

/// Rewrite a parsed schema document for one tenant.
///
/// Handles documents where none, one, or both key families are present;
/// anything unrecognized passes through unchanged.
#[must_use]
pub fn transform(document: &Value, tenant: &str) -> Value {
    let mut out = document.clone();

    for key in RESOURCE_KEYS {
        if let Some(Value::Sequence(items)) = out.get_mut(key) {
            for item in items {
                prefix_name(item, tenant);
            }
        }
    }

    if let Some(Value::Sequence(sources)) = out.get_mut("sources") {
        for source in sources {
            if let Value::Mapping(entry) = source {
                entry.insert(
                    Value::String("schema".to_string()),
                    Value::String(tenant.to_string()),
                );
            }
        }
    }

    out
}

/// Parse, transform, and re-serialize a schema document.
///
/// A parse failure is fatal for the run and names the offending file.
///
/// # Errors
///
/// Returns [`TenfoldError::SchemaParseError`] when the text is not valid
/// YAML, or an error if serialization of the rewritten document fails.
pub fn transform_text(text: &str, tenant: &str, file: &str) -> Result<String> {
    let document: Value =
        serde_yaml::from_str(text).map_err(|e| TenfoldError::SchemaParseError {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

    let rewritten = transform(&document, tenant);
    Ok(serde_yaml::to_string(&rewritten)?)
}

fn prefix_name(item: &mut Value, tenant: &str) {
    if let Value::Mapping(entry) = item {
        let name_key = Value::String("name".to_string());
        if let Some(Value::String(name)) = entry.get(&name_key) {
            let renamed = tenant_name(tenant, name);
            entry.insert(name_key, Value::String(renamed));
        }
    }
}
