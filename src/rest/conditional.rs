//! Conditional request evaluation.
//!
//! ETags are compared as opaque, case-sensitive strings. An ETag match always
//! wins over the date check.

use chrono::NaiveDateTime;

use crate::rest::request::ParsedRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current; answer 304 without a body.
    Unchanged,
    Modified,
}

pub fn evaluate(req: &ParsedRequest, updated: NaiveDateTime, etag: &str) -> Freshness {
    if req.if_none_match.as_deref() == Some(etag) {
        return Freshness::Unchanged;
    }

    match req.if_modified_since {
        Some(since) if updated <= since => Freshness::Unchanged,
        _ => Freshness::Modified,
    }
}

/// `true` when a mutating request may proceed against an item whose current
/// tag is `etag`.
pub fn precondition_holds(req: &ParsedRequest, etag: &str) -> bool {
    req.if_match.as_deref().is_none_or(|expected| expected == etag)
}
