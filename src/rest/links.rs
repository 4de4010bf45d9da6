//! HATEOAS link construction.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::config::ApiConfig;
use crate::rest::request::ParsedRequest;
use crate::rest::settings::ResourceSettings;

/// Characters escaped in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub href: String,
}

impl Link {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "title": self.title, "href": self.href })
    }
}

/// `/{url_prefix}/{api_version}`, each part omitted when unset.
pub fn api_prefix(url_prefix: &str, api_version: &str) -> String {
    let mut prefix = String::new();
    for part in [url_prefix, api_version] {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            prefix.push('/');
            prefix.push_str(part);
        }
    }
    prefix
}

pub fn home_link(server_name: Option<&str>, url_prefix: &str, api_version: &str) -> Link {
    Link::new(
        "home",
        format!("{}{}", server_name.unwrap_or_default(), api_prefix(url_prefix, api_version)),
    )
}

/// Builds absolute links from the API configuration it was created with.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    server_name: String,
    prefix: String,
    home: Link,
}

impl LinkBuilder {
    pub fn new(api: &ApiConfig) -> Self {
        Self {
            server_name: api.server_name.clone().unwrap_or_default(),
            prefix: api_prefix(&api.url_prefix, &api.api_version),
            home: home_link(api.server_name.as_deref(), &api.url_prefix, &api.api_version),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn home(&self) -> Link {
        self.home.clone()
    }

    pub fn resource_uri(&self, settings: &ResourceSettings) -> String {
        format!("{}{}/{}", self.server_name, self.prefix, settings.url)
    }

    pub fn resource(&self, settings: &ResourceSettings) -> Link {
        Link::new(settings.url.clone(), self.resource_uri(settings))
    }

    pub fn item(&self, settings: &ResourceSettings, item_id: &str) -> Link {
        Link::new(
            settings.item_title.clone(),
            format!(
                "{}/{}",
                self.resource_uri(settings),
                utf8_percent_encode(item_id, PATH_SEGMENT)
            ),
        )
    }

    /// `next`, `last` and `prev` links for a listing of `total` documents.
    /// Empty when pagination is off or nothing matched.
    pub fn pagination(
        &self,
        settings: &ResourceSettings,
        req: &ParsedRequest,
        total: u64,
    ) -> BTreeMap<String, Link> {
        let mut links = BTreeMap::new();
        if !settings.pagination || total == 0 || req.max_results == 0 {
            return links;
        }

        let base = self.resource_uri(settings);
        let href = |page: u64| format!("{}{}", base, query_string(req, page));

        if req.page.saturating_mul(req.max_results) < total {
            links.insert("next".to_string(), Link::new("next page", href(req.page + 1)));

            let last_page = total.div_ceil(req.max_results);
            links.insert("last".to_string(), Link::new("last page", href(last_page)));
        }

        if req.page > 1 {
            links.insert("prev".to_string(), Link::new("previous page", href(req.page - 1)));
        }

        links
    }
}

/// The query string reproducing `req` at another page.
fn query_string(req: &ParsedRequest, page: u64) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("max_results", &req.max_results.to_string());
    for (name, value) in [
        ("where", &req.r#where),
        ("sort", &req.sort),
        ("projection", &req.projection),
        ("embedded", &req.embedded),
    ] {
        if let Some(value) = value {
            query.append_pair(name, value);
        }
    }
    query.append_pair("page", &page.to_string());
    format!("?{}", query.finish())
}
