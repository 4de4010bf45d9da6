use std::borrow::Cow;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::config::Config;
use crate::datastore::{Datastore, DatastoreClient};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::rest::clock::to_wire_format;
use crate::rest::error::RestError;
use crate::rest::handlers::{self, Context, Outcome};
use crate::rest::links::LinkBuilder;
use crate::rest::request::parse;
use crate::rest::settings::{Registry, ResourceSettings};

/// What a request path points at, once the API prefix is stripped.
enum Endpoint<'a> {
    Home,
    Resource(&'a ResourceSettings),
    /// The id is percent-decoded.
    Item(&'a ResourceSettings, Cow<'a, str>),
}

/// Maps (verb, path) onto a handler. Built once at startup and shared
/// read-only by every connection.
pub struct Router {
    registry: Registry,
    links: LinkBuilder,
    store: DatastoreClient,
}

impl Router {
    pub fn new(config: &Config, store: Arc<dyn Datastore>) -> Self {
        Self {
            registry: Registry::build(&config.domain, &config.api.defaults),
            links: LinkBuilder::new(&config.api),
            store: DatastoreClient::new(store, config.datastore.timeout()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn dispatch(&self, req: &Request) -> Response {
        let response = match self.route(req).await {
            Ok(outcome) => into_response(outcome),
            Err(e) => {
                let status = e.status();
                if status == StatusCode::InternalServerError || status == StatusCode::GatewayTimeout {
                    tracing::error!(method = ?req.method, path = %req.path, error = %e, "Request failed");
                }
                Response::error(status, &e.to_string())
            }
        };

        tracing::info!(
            method = ?req.method,
            path = %req.path,
            status = response.status.as_u16(),
            "Handled request"
        );

        response
    }

    async fn route(&self, req: &Request) -> Result<Outcome, RestError> {
        let ctx = Context {
            store: &self.store,
            links: &self.links,
        };

        match self.resolve(req.route())? {
            Endpoint::Home => match req.method {
                Method::GET => Ok(handlers::home(&self.links, &self.registry)),
                _ => Err(RestError::MethodNotAllowed),
            },

            Endpoint::Resource(settings) => {
                if !settings.allows_resource_method(req.method.as_str()) {
                    return Err(RestError::MethodNotAllowed);
                }
                let parsed = parse(req, settings);
                match req.method {
                    Method::GET => handlers::get_resource(&ctx, settings, &parsed).await,
                    _ => Err(RestError::MethodNotAllowed),
                }
            }

            Endpoint::Item(settings, item_id) => {
                if !settings.allows_item_method(req.method.as_str()) {
                    return Err(RestError::MethodNotAllowed);
                }
                let parsed = parse(req, settings);
                match req.method {
                    Method::GET => handlers::get_item(&ctx, settings, &parsed, &item_id).await,
                    Method::DELETE => handlers::delete_item(&ctx, settings, &parsed, &item_id).await,
                    _ => Err(RestError::MethodNotAllowed),
                }
            }
        }
    }

    fn resolve<'a>(&'a self, route: &'a str) -> Result<Endpoint<'a>, RestError> {
        let prefix = self.links.prefix();
        let rest = route.strip_prefix(prefix).ok_or(RestError::NotFound)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return Err(RestError::NotFound);
        }

        let rest = rest.trim_matches('/');
        if rest.is_empty() {
            return Ok(Endpoint::Home);
        }

        if let Some(settings) = self.registry.by_url(rest) {
            return Ok(Endpoint::Resource(settings));
        }

        let (url, raw_id) = rest.rsplit_once('/').ok_or(RestError::NotFound)?;
        let settings = self.registry.by_url(url).ok_or(RestError::NotFound)?;
        let item_id = percent_decode_str(raw_id)
            .decode_utf8()
            .map_err(|_| RestError::NotFound)?;
        if item_id.is_empty() {
            return Err(RestError::NotFound);
        }

        Ok(Endpoint::Item(settings, item_id))
    }
}

fn into_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Rendered {
            body,
            etag,
            last_modified,
        } => {
            let mut builder = ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "application/json");
            if let Some(etag) = etag {
                builder = builder.header("ETag", etag);
            }
            if let Some(last_modified) = to_wire_format(last_modified) {
                builder = builder.header("Last-Modified", last_modified);
            }
            builder.body(body).build()
        }

        Outcome::NotModified {
            etag,
            last_modified,
        } => {
            let mut builder = ResponseBuilder::new(StatusCode::NotModified).header("ETag", etag);
            if let Some(last_modified) = to_wire_format(Some(last_modified)) {
                builder = builder.header("Last-Modified", last_modified);
            }
            builder.build()
        }

        Outcome::PreconditionFailed => Response::error(
            StatusCode::PreconditionFailed,
            "client and server etags don't match",
        ),

        Outcome::Deleted => ResponseBuilder::new(StatusCode::NoContent).build(),
    }
}
