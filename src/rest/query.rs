//! Interpretation of the raw `where`, `sort` and `projection` expressions.

use std::collections::BTreeSet;

use crate::rest::document::{Document, Value, document_from_json};
use crate::rest::error::RestError;
use crate::rest::settings::ResourceSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

pub type SortSpec = Vec<(String, SortOrder)>;

/// Builds the equality filter for a lookup: the client's `where` object
/// combined with the resource's datasource filter. The datasource filter wins
/// on conflicting keys.
pub fn lookup_filter(raw_where: Option<&str>, settings: &ResourceSettings) -> Result<Document, RestError> {
    let mut filter = match raw_where {
        Some(raw) => parse_where(raw, settings)?,
        None => Document::new(),
    };

    if let Some(fixed) = &settings.datasource.filter {
        filter.extend(fixed.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Ok(filter)
}

fn parse_where(raw: &str, settings: &ResourceSettings) -> Result<Document, RestError> {
    let parsed: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| RestError::InvalidQuery(format!("where: {}", e)))?;

    let serde_json::Value::Object(map) = parsed else {
        return Err(RestError::InvalidQuery("where: expected a JSON object".to_string()));
    };

    for (field, value) in &map {
        if !settings.allows_filter_on(field) {
            return Err(RestError::InvalidQuery(format!("where: filtering on {:?} is not allowed", field)));
        }
        if value.is_object() || value.is_array() {
            return Err(RestError::InvalidQuery(format!("where: {:?} must be compared to a scalar", field)));
        }
    }

    Ok(document_from_json(map))
}

/// `name,-created` → name ascending, then created descending.
pub fn parse_sort(raw: Option<&str>) -> SortSpec {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty() && *key != "-")
        .map(|key| match key.strip_prefix('-') {
            Some(field) => (field.to_string(), SortOrder::Descending),
            None => (key.to_string(), SortOrder::Ascending),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl Projection {
    /// Parses `{"field": 1, ...}` or `{"field": 0, ...}`. Mixing the two is
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self, RestError> {
        let parsed: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| RestError::InvalidQuery(format!("projection: {}", e)))?;

        let serde_json::Value::Object(map) = parsed else {
            return Err(RestError::InvalidQuery("projection: expected a JSON object".to_string()));
        };

        let mut include = BTreeSet::new();
        let mut exclude = BTreeSet::new();
        for (field, flag) in map {
            match flag.as_i64().or_else(|| flag.as_bool().map(i64::from)) {
                Some(0) => exclude.insert(field),
                Some(1) => include.insert(field),
                _ => {
                    return Err(RestError::InvalidQuery(format!(
                        "projection: {:?} must be 0 or 1",
                        field
                    )));
                }
            };
        }

        match (include.is_empty(), exclude.is_empty()) {
            (false, true) | (true, true) => Ok(Projection::Include(include)),
            (true, false) => Ok(Projection::Exclude(exclude)),
            (false, false) => Err(RestError::InvalidQuery(
                "projection: cannot mix inclusion and exclusion".to_string(),
            )),
        }
    }

    /// Applies the projection; fields in `always` are kept regardless.
    pub fn apply(&self, doc: &mut Document, always: &[&str]) {
        match self {
            Projection::Include(fields) if fields.is_empty() => {}
            Projection::Include(fields) => {
                doc.retain(|k, _| fields.contains(k) || always.contains(&k.as_str()))
            }
            Projection::Exclude(fields) => {
                doc.retain(|k, _| !fields.contains(k) || always.contains(&k.as_str()))
            }
        }
    }
}

/// Scalar lookup value for an item id taken from the URL.
pub fn item_id_value(id: &str) -> Value {
    Value::String(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_spec_parses_direction() {
        assert_eq!(
            parse_sort(Some("name, -created,,")),
            vec![
                ("name".to_string(), SortOrder::Ascending),
                ("created".to_string(), SortOrder::Descending),
            ]
        );
        assert!(parse_sort(None).is_empty());
    }

    #[test]
    fn projection_keeps_automatic_fields() {
        let mut doc = Document::from([
            ("_id".to_string(), Value::from("1")),
            ("name".to_string(), Value::from("x")),
            ("secret".to_string(), Value::from("y")),
        ]);

        Projection::parse(r#"{"name": 1}"#).unwrap().apply(&mut doc, &["_id"]);

        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["_id", "name"]);
    }

    #[test]
    fn mixed_projection_is_rejected() {
        assert!(Projection::parse(r#"{"a": 1, "b": 0}"#).is_err());
        assert!(Projection::parse("[1]").is_err());
    }
}
