//! Per-resource settings.
//!
//! Settings are resolved once, when resources are registered, by laying the
//! explicit overrides from the `domain` section over the global defaults.
//! The resulting [`Registry`] is immutable and shared read-only by every
//! request.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::rest::document::{Document, document_from_json};
use crate::rest::schema::{Schema, fields_with_defaults};

/// Defaults every resource inherits unless it overrides them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalDefaults {
    /// Field patterns clients may filter on; `*` allows all.
    pub allowed_filters: Vec<String>,
    pub sorting: bool,
    pub embedding: bool,
    pub pagination: bool,
    pub projection: bool,
    /// Hard upper bound for `max_results`.
    pub pagination_limit: u32,
    /// Page size used when the client does not ask for one.
    pub pagination_default: u32,
    pub item_methods: Vec<String>,
    pub resource_methods: Vec<String>,
    pub item_lookup_field: String,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            allowed_filters: vec!["*".to_string()],
            sorting: true,
            embedding: true,
            pagination: true,
            projection: true,
            pagination_limit: 50,
            pagination_default: 25,
            item_methods: vec!["GET".to_string()],
            resource_methods: vec!["GET".to_string()],
            item_lookup_field: "_id".to_string(),
        }
    }
}

/// Explicit per-resource configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceOverrides {
    pub url: Option<String>,
    pub item_title: Option<String>,
    pub allowed_filters: Option<Vec<String>>,
    pub sorting: Option<bool>,
    pub embedding: Option<bool>,
    pub pagination: Option<bool>,
    pub projection: Option<bool>,
    pub pagination_limit: Option<u32>,
    pub pagination_default: Option<u32>,
    pub item_methods: Option<Vec<String>>,
    pub resource_methods: Option<Vec<String>>,
    pub item_lookup_field: Option<String>,
    pub schema: Option<Schema>,
    pub datasource: Option<DatasourceOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatasourceOverrides {
    pub source: Option<String>,
    pub filter: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Datasource {
    /// Collection the resource reads from.
    pub source: String,
    /// Equality filter applied to every lookup.
    pub filter: Option<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSettings {
    pub name: String,
    pub url: String,
    pub item_title: String,
    pub allowed_filters: BTreeSet<String>,
    pub sorting: bool,
    pub embedding: bool,
    pub pagination: bool,
    pub projection: bool,
    pub pagination_limit: u32,
    pub pagination_default: u32,
    pub item_methods: BTreeSet<String>,
    pub resource_methods: BTreeSet<String>,
    pub item_lookup_field: String,
    /// Empty for read-only passthrough resources.
    pub schema: Schema,
    /// Schema fields that declare a default value.
    pub defaults: BTreeSet<String>,
    pub datasource: Datasource,
}

impl ResourceSettings {
    pub fn filtering(&self) -> bool {
        !self.allowed_filters.is_empty()
    }

    pub fn allows_filter_on(&self, field: &str) -> bool {
        self.allowed_filters.contains("*") || self.allowed_filters.contains(field)
    }

    pub fn allows_resource_method(&self, method: &str) -> bool {
        self.resource_methods.contains(method)
    }

    pub fn allows_item_method(&self, method: &str) -> bool {
        self.item_methods.contains(method)
    }
}

/// Values that do not override a default even when given explicitly.
trait Explicit {
    fn is_blank(&self) -> bool;
}

impl Explicit for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Explicit for u32 {
    fn is_blank(&self) -> bool {
        *self == 0
    }
}

// `false` and empty lists are meaningful: they switch capabilities off.
impl Explicit for bool {
    fn is_blank(&self) -> bool {
        false
    }
}

impl Explicit for Vec<String> {
    fn is_blank(&self) -> bool {
        false
    }
}

fn pick<T: Explicit + Clone>(explicit: &Option<T>, default: &T) -> T {
    match explicit {
        Some(value) if !value.is_blank() => value.clone(),
        _ => default.clone(),
    }
}

/// Resolves the effective settings of `name`. Pure: the same inputs always
/// produce the same settings.
pub fn resolve(name: &str, overrides: &ResourceOverrides, defaults: &GlobalDefaults) -> ResourceSettings {
    let url = pick(&overrides.url, &name.to_string());
    let url = url.trim_matches('/').to_string();
    let item_title = pick(&overrides.item_title, &singular(name));

    let schema = overrides.schema.clone().unwrap_or_default();
    let defaults_set = fields_with_defaults(&schema);

    let datasource = overrides.datasource.clone().unwrap_or_default();
    let datasource = Datasource {
        source: pick(&datasource.source, &name.to_string()),
        filter: datasource.filter.map(document_from_json),
    };

    ResourceSettings {
        name: name.to_string(),
        url,
        item_title,
        allowed_filters: pick(&overrides.allowed_filters, &defaults.allowed_filters)
            .into_iter()
            .collect(),
        sorting: pick(&overrides.sorting, &defaults.sorting),
        embedding: pick(&overrides.embedding, &defaults.embedding),
        pagination: pick(&overrides.pagination, &defaults.pagination),
        projection: pick(&overrides.projection, &defaults.projection),
        pagination_limit: pick(&overrides.pagination_limit, &defaults.pagination_limit),
        pagination_default: pick(&overrides.pagination_default, &defaults.pagination_default),
        item_methods: methods(pick(&overrides.item_methods, &defaults.item_methods)),
        resource_methods: methods(pick(&overrides.resource_methods, &defaults.resource_methods)),
        item_lookup_field: pick(&overrides.item_lookup_field, &defaults.item_lookup_field),
        schema,
        defaults: defaults_set,
        datasource,
    }
}

fn methods(list: Vec<String>) -> BTreeSet<String> {
    list.into_iter().map(|m| m.to_ascii_uppercase()).collect()
}

fn singular(name: &str) -> String {
    name.strip_suffix('s').filter(|s| !s.is_empty()).unwrap_or(name).to_string()
}

/// Read-only map of resource name → effective settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    resources: BTreeMap<String, ResourceSettings>,
}

impl Registry {
    pub fn build(domain: &BTreeMap<String, ResourceOverrides>, defaults: &GlobalDefaults) -> Self {
        let resources = domain
            .iter()
            .map(|(name, overrides)| {
                let settings = resolve(name, overrides, defaults);
                tracing::info!(
                    resource = %name,
                    url = %settings.url,
                    source = %settings.datasource.source,
                    "Registered resource"
                );
                (name.clone(), settings)
            })
            .collect();

        Self { resources }
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSettings> {
        self.resources.get(name)
    }

    /// Finds the resource mounted at `url` (no surrounding slashes).
    pub fn by_url(&self, url: &str) -> Option<&ResourceSettings> {
        self.resources.values().find(|s| s.url == url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSettings> {
        self.resources.values()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
