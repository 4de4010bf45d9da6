use sha1::{Digest, Sha1};

use crate::rest::document::{Document, Value};
use crate::rest::error::RenderError;
use crate::rest::render::{document_to_json, to_json};

/// SHA-1 over the canonical JSON form of `doc`, as 40 lowercase hex chars.
///
/// Keys are sorted at every level and identifiers are reduced to their hex
/// form first, so the tag depends only on content and is identical across
/// processes.
pub fn compute_etag(doc: &Document) -> Result<String, RenderError> {
    let canonical = serde_json::Value::Object(document_to_json(doc)?);
    Ok(digest(&canonical))
}

/// Same as [`compute_etag`] for an arbitrary value.
pub fn compute_value_etag(value: &Value) -> Result<String, RenderError> {
    Ok(digest(&to_json("", value)?))
}

fn digest(canonical: &serde_json::Value) -> String {
    let mut hasher = Sha1::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
