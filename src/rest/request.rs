//! Request parsing.
//!
//! [`parse`] turns whatever the transport hands us into a [`ParsedRequest`],
//! honouring the capability flags of the resource being accessed. Nothing in
//! here fails: malformed paging input falls back to safe defaults.

use chrono::NaiveDateTime;

use crate::rest::clock::weak_comparison_bound;
use crate::rest::settings::ResourceSettings;

/// Anything exposing ordered header and query name/value pairs.
pub trait RequestSource {
    fn header_pairs(&self) -> &[(String, String)];

    fn query_pairs(&self) -> Vec<(String, String)>;

    /// First header with the given name, ignoring ASCII case.
    fn header_value(&self, name: &str) -> Option<&str> {
        self.header_pairs()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub r#where: Option<String>,
    pub projection: Option<String>,
    pub sort: Option<String>,
    pub embedded: Option<String>,
    /// 1-based page index.
    pub page: u64,
    /// 0 means unbounded.
    pub max_results: u64,
    /// Already shifted by one second, see [`weak_comparison_bound`].
    pub if_modified_since: Option<NaiveDateTime>,
    pub if_none_match: Option<String>,
    pub if_match: Option<String>,
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self {
            r#where: None,
            projection: None,
            sort: None,
            embedded: None,
            page: 1,
            max_results: 0,
            if_modified_since: None,
            if_none_match: None,
            if_match: None,
        }
    }
}

impl ParsedRequest {
    /// Number of documents to skip to reach the current page.
    pub fn skip(&self) -> u64 {
        if self.max_results == 0 {
            0
        } else {
            (self.page - 1).saturating_mul(self.max_results)
        }
    }

    pub fn limit(&self) -> Option<u64> {
        (self.max_results > 0).then_some(self.max_results)
    }
}

pub fn parse<R: RequestSource + ?Sized>(request: &R, settings: &ResourceSettings) -> ParsedRequest {
    let args = request.query_pairs();
    let arg = |name: &str| {
        args.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    let mut parsed = ParsedRequest::default();

    if settings.filtering() {
        parsed.r#where = arg("where");
    }
    if settings.projection {
        parsed.projection = arg("projection");
    }
    if settings.sorting {
        parsed.sort = arg("sort");
    }
    if settings.embedding {
        parsed.embedded = arg("embedded");
    }

    if settings.pagination {
        parsed.page = arg("page").as_deref().map_or(1, parse_page);
        parsed.max_results = arg("max_results")
            .as_deref()
            .and_then(parse_max_results)
            .unwrap_or(u64::from(settings.pagination_default))
            .min(u64::from(settings.pagination_limit));
    }

    parsed.if_modified_since = weak_comparison_bound(request.header_value("If-Modified-Since"));
    parsed.if_none_match = request.header_value("If-None-Match").map(str::to_string);
    parsed.if_match = request.header_value("If-Match").map(str::to_string);

    parsed
}

/// Absolute value of an integer; anything unparseable or zero is page 1.
fn parse_page(raw: &str) -> u64 {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => 1,
        Ok(n) => n.unsigned_abs(),
    }
}

/// Numbers are truncated toward zero; non-positive values are rejected.
fn parse_max_results(raw: &str) -> Option<u64> {
    let value = raw.trim().parse::<f64>().ok()?;
    if !value.is_finite() || value < 1.0 {
        return None;
    }
    Some(value.trunc() as u64)
}
