//! Restling - REST resource exposition
//!
//! Serves a generic resource/item model over HTTP as JSON with HATEOAS links,
//! conditional-request support and deterministic ETags.

pub mod config;
pub mod datastore;
pub mod http;
pub mod rest;
pub mod server;
