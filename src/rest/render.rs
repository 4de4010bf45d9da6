//! JSON rendering.
//!
//! Dates go out in the wire format and identifiers as plain strings. Object
//! keys come out sorted because `serde_json::Map` is ordered by key.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value as Json};

use crate::rest::clock::WIRE_FORMAT;
use crate::rest::document::{Document, Value};
use crate::rest::error::RenderError;
use crate::rest::links::Link;

/// Converts a value into its canonical JSON form. `field` names the
/// enclosing field for error reporting.
pub fn to_json(field: &str, value: &Value) -> Result<Json, RenderError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| RenderError::UnencodableValue {
                field: field.to_string(),
                reason: format!("non-finite number {}", f),
            })?,
        Value::String(s) => Json::String(s.clone()),
        Value::DateTime(t) => Json::String(t.format(WIRE_FORMAT).to_string()),
        Value::ZonedDateTime(t) => Json::String(t.naive_utc().format(WIRE_FORMAT).to_string()),
        Value::ObjectId(id) => Json::String(id.to_hex()),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(|item| to_json(field, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(doc) => Json::Object(document_to_json(doc)?),
    })
}

pub fn document_to_json(doc: &Document) -> Result<Map<String, Json>, RenderError> {
    doc.iter()
        .map(|(k, v)| Ok((k.clone(), to_json(k, v)?)))
        .collect()
}

/// Renders `{"items": [...], "links": {...}}`. The whole payload is encoded
/// before anything is returned, so a failure never leaves partial output.
pub fn render_envelope(
    items: &[Document],
    links: &BTreeMap<String, Link>,
) -> Result<Vec<u8>, RenderError> {
    let items = items
        .iter()
        .map(|doc| document_to_json(doc).map(Json::Object))
        .collect::<Result<Vec<_>, _>>()?;

    let links = links
        .iter()
        .map(|(rel, link)| (rel.clone(), link.to_json()))
        .collect::<Map<_, _>>();

    let mut envelope = Map::new();
    envelope.insert("items".to_string(), Json::Array(items));
    envelope.insert("links".to_string(), Json::Object(links));

    Ok(Json::Object(envelope).to_string().into_bytes())
}
