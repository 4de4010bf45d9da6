//! Request handlers.
//!
//! One plain async function per verb and endpoint. Each takes the already
//! parsed request and the resource settings and returns an [`Outcome`]; the
//! router turns that into an HTTP response.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::datastore::{DatastoreClient, FindQuery};
use crate::rest::conditional::{Freshness, evaluate, precondition_holds};
use crate::rest::document::Document;
use crate::rest::error::RestError;
use crate::rest::item::{Item, SetMeta};
use crate::rest::links::{Link, LinkBuilder};
use crate::rest::query::{Projection, item_id_value, lookup_filter, parse_sort};
use crate::rest::render::render_envelope;
use crate::rest::request::ParsedRequest;
use crate::rest::settings::{Registry, ResourceSettings};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered {
        body: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<NaiveDateTime>,
    },
    NotModified {
        etag: String,
        last_modified: NaiveDateTime,
    },
    PreconditionFailed,
    Deleted,
}

/// Shared, read-only collaborators handed to every handler.
pub struct Context<'a> {
    pub store: &'a DatastoreClient,
    pub links: &'a LinkBuilder,
}

/// `GET /`: links to every registered resource.
pub fn home(links: &LinkBuilder, registry: &Registry) -> Outcome {
    let children: Vec<_> = registry.iter().map(|s| links.resource(s).to_json()).collect();
    let body = serde_json::json!({ "links": { "child": children } });

    Outcome::Rendered {
        body: body.to_string().into_bytes(),
        etag: None,
        last_modified: None,
    }
}

/// `GET /{resource}`
pub async fn get_resource(
    ctx: &Context<'_>,
    settings: &ResourceSettings,
    req: &ParsedRequest,
) -> Result<Outcome, RestError> {
    let filter = lookup_filter(req.r#where.as_deref(), settings)?;
    let projection = req.projection.as_deref().map(Projection::parse).transpose()?;
    let source = settings.datasource.source.as_str();

    let total = if settings.pagination {
        ctx.store.count(source, &filter).await?
    } else {
        0
    };

    let query = FindQuery {
        filter,
        sort: parse_sort(req.sort.as_deref()),
        skip: req.skip(),
        limit: req.limit(),
    };
    let items = ctx
        .store
        .find(source, &query)
        .await?
        .into_iter()
        .map(Item::from_document)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = SetMeta::of(&items)?;
    if evaluate(req, meta.last_modified, &meta.etag) == Freshness::Unchanged {
        return Ok(Outcome::NotModified {
            etag: meta.etag,
            last_modified: meta.last_modified,
        });
    }

    let mut links = BTreeMap::from([
        ("parent".to_string(), ctx.links.home()),
        ("self".to_string(), ctx.links.resource(settings)),
    ]);
    links.extend(ctx.links.pagination(settings, req, total));

    let docs: Vec<Document> = items
        .into_iter()
        .map(|item| item.into_rendered(projection.as_ref(), &settings.item_lookup_field))
        .collect();

    Ok(Outcome::Rendered {
        body: render_envelope(&docs, &links)?,
        etag: Some(meta.etag),
        last_modified: Some(meta.last_modified),
    })
}

/// `GET /{resource}/{id}`
pub async fn get_item(
    ctx: &Context<'_>,
    settings: &ResourceSettings,
    req: &ParsedRequest,
    item_id: &str,
) -> Result<Outcome, RestError> {
    let projection = req.projection.as_deref().map(Projection::parse).transpose()?;
    let item = find_item(ctx, settings, item_id).await?;

    if evaluate(req, item.updated, &item.etag) == Freshness::Unchanged {
        return Ok(Outcome::NotModified {
            etag: item.etag,
            last_modified: item.updated,
        });
    }

    let links = item_links(ctx.links, settings, item_id);
    let etag = item.etag.clone();
    let last_modified = item.updated;
    let doc = item.into_rendered(projection.as_ref(), &settings.item_lookup_field);

    Ok(Outcome::Rendered {
        body: render_envelope(&[doc], &links)?,
        etag: Some(etag),
        last_modified: Some(last_modified),
    })
}

/// `DELETE /{resource}/{id}`. A stale `If-Match` leaves the item untouched.
pub async fn delete_item(
    ctx: &Context<'_>,
    settings: &ResourceSettings,
    req: &ParsedRequest,
    item_id: &str,
) -> Result<Outcome, RestError> {
    let item = find_item(ctx, settings, item_id).await?;

    if !precondition_holds(req, &item.etag) {
        tracing::debug!(resource = %settings.name, item = %item_id, "If-Match does not match current etag");
        return Ok(Outcome::PreconditionFailed);
    }

    let removed = ctx
        .store
        .remove(&settings.datasource.source, &item_filter(settings, item_id)?)
        .await?;
    tracing::info!(resource = %settings.name, item = %item_id, removed, "Deleted item");

    Ok(Outcome::Deleted)
}

fn item_filter(settings: &ResourceSettings, item_id: &str) -> Result<Document, RestError> {
    let mut filter = lookup_filter(None, settings)?;
    filter.insert(settings.item_lookup_field.clone(), item_id_value(item_id));
    Ok(filter)
}

async fn find_item(ctx: &Context<'_>, settings: &ResourceSettings, item_id: &str) -> Result<Item, RestError> {
    let query = FindQuery {
        filter: item_filter(settings, item_id)?,
        limit: Some(1),
        ..FindQuery::default()
    };

    let doc = ctx
        .store
        .find(&settings.datasource.source, &query)
        .await?
        .into_iter()
        .next()
        .ok_or(RestError::NotFound)?;

    Ok(Item::from_document(doc)?)
}

fn item_links(links: &LinkBuilder, settings: &ResourceSettings, item_id: &str) -> BTreeMap<String, Link> {
    BTreeMap::from([
        ("parent".to_string(), links.home()),
        ("collection".to_string(), links.resource(settings)),
        ("self".to_string(), links.item(settings, item_id)),
    ])
}
