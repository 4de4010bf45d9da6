//! Resource schema definitions.
//!
//! Each field is a tagged variant keyed by `type`, mirroring the YAML shape:
//!
//! ```yaml
//! firstname:
//!   type: string
//!   minlength: 1
//!   maxlength: 10
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

pub type Schema = BTreeMap<String, FieldDefinition>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDefinition {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    String {
        #[serde(default)]
        minlength: Option<usize>,
        #[serde(default)]
        maxlength: Option<usize>,
    },
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Datetime,
    Dict {
        #[serde(default)]
        schema: Schema,
    },
    List {
        #[serde(default)]
        schema: Option<Box<FieldDefinition>>,
    },
}

/// Names of the top-level fields that declare a default value.
// TODO: collect defaults declared inside `dict` fields once nested documents
// are written through the API.
pub fn fields_with_defaults(schema: &Schema) -> BTreeSet<String> {
    schema
        .iter()
        .filter(|(_, definition)| definition.default.is_some())
        .map(|(name, _)| name.clone())
        .collect()
}
