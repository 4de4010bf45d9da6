//! REST resource exposition.
//!
//! Leaf-first:
//!
//! - **`clock`**: wire date format, epoch fallback and the `If-Modified-Since` bound
//! - **`document`**: the document model shared with the datastore
//! - **`etag`**: content fingerprints
//! - **`schema`** / **`settings`**: per-resource configuration and its resolution
//! - **`request`** / **`query`**: client request parsing and query interpretation
//! - **`conditional`**: `If-None-Match` / `If-Modified-Since` / `If-Match`
//! - **`links`**: HATEOAS links
//! - **`item`** / **`render`**: response enrichment and JSON encoding
//! - **`handlers`** / **`router`**: verb and path dispatch

pub mod clock;
pub mod conditional;
pub mod document;
pub mod error;
pub mod etag;
pub mod handlers;
pub mod item;
pub mod links;
pub mod query;
pub mod render;
pub mod request;
pub mod router;
pub mod schema;
pub mod settings;
