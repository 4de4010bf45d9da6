//! Response-time enrichment of stored documents.

use chrono::NaiveDateTime;

use crate::rest::clock::{epoch, timestamp_of};
use crate::rest::document::{Document, Value};
use crate::rest::error::RenderError;
use crate::rest::etag::{compute_etag, compute_value_etag};
use crate::rest::query::Projection;

pub const UPDATED: &str = "updated";
pub const CREATED: &str = "created";
pub const ETAG: &str = "etag";

/// A stored document together with its derived `updated`, `created` and
/// `etag` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub document: Document,
    pub updated: NaiveDateTime,
    pub created: NaiveDateTime,
    pub etag: String,
}

impl Item {
    /// Documents written outside this API may lack timestamps; they get the
    /// epoch instead of an error. The tag is computed after the timestamps
    /// are filled in, over everything except a previously stored tag.
    pub fn from_document(mut document: Document) -> Result<Self, RenderError> {
        let updated = timestamp_of(document.get(UPDATED)).unwrap_or_else(epoch);
        let created = timestamp_of(document.get(CREATED)).unwrap_or_else(epoch);

        document.insert(UPDATED.to_string(), Value::DateTime(updated));
        document.insert(CREATED.to_string(), Value::DateTime(created));
        document.remove(ETAG);

        let etag = compute_etag(&document)?;

        Ok(Self {
            document,
            updated,
            created,
            etag,
        })
    }

    /// The document as it goes on the wire. `lookup_field` and the derived
    /// fields survive any projection.
    pub fn into_rendered(self, projection: Option<&Projection>, lookup_field: &str) -> Document {
        let mut document = self.document;
        document.insert(ETAG.to_string(), Value::String(self.etag));

        if let Some(projection) = projection {
            projection.apply(&mut document, &[lookup_field, UPDATED, CREATED, ETAG]);
        }

        document
    }
}

/// Validators for a whole listing: the newest `updated` (epoch when empty)
/// and a tag over the ordered item tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMeta {
    pub last_modified: NaiveDateTime,
    pub etag: String,
}

impl SetMeta {
    pub fn of(items: &[Item]) -> Result<Self, RenderError> {
        let last_modified = items
            .iter()
            .map(|item| item.updated)
            .max()
            .unwrap_or_else(epoch);

        let tags = Value::Array(items.iter().map(|item| Value::String(item.etag.clone())).collect());

        Ok(Self {
            last_modified,
            etag: compute_value_etag(&tags)?,
        })
    }
}
