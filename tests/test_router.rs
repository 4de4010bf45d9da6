use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use restling::config::Config;
use restling::datastore::{Datastore, DatastoreError, Filter, FindQuery, MemoryDatastore};
use restling::http::request::{Method, RequestBuilder};
use restling::http::response::{Response, StatusCode};
use restling::rest::document::Document;
use restling::rest::router::Router;

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

const CONFIG: &str = r#"
api:
  server_name: localhost:5000
  url_prefix: api
  api_version: v1

datastore:
  seed:
    jobs:
      - user: hanso
      - user: pie
    contacts:
      - name: ann
      - name: ben
      - name: cid

domain:
  jobs:
    item_lookup_field: user
    item_methods: [GET, DELETE]
  contacts:
    url: people
    allowed_filters: [name]
"#;

fn router() -> Router {
    let cfg = Config::from_yaml_str(CONFIG).unwrap();
    let store = Arc::new(MemoryDatastore::seeded(&cfg.datastore.seed));
    Router::new(&cfg, store)
}

async fn send(router: &Router, method: Method, path: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = RequestBuilder::new().method(method).path(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    router.dispatch(&builder.build().unwrap()).await
}

fn body(response: &Response) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
}

#[tokio::test]
async fn test_list_enriches_bare_documents() {
    let router = router();
    let response = send(&router, Method::GET, "/api/v1/jobs", &[]).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(response.headers["Last-Modified"], EPOCH);
    assert_eq!(response.headers["ETag"].len(), 40);

    let json = body(&response);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item["updated"], EPOCH);
        assert_eq!(item["created"], EPOCH);
        assert_eq!(item["etag"].as_str().unwrap().len(), 40);
        assert_eq!(item["_id"].as_str().unwrap().len(), 24);
    }

    assert_eq!(json["links"]["parent"]["title"], "home");
    assert_eq!(json["links"]["parent"]["href"], "localhost:5000/api/v1");
    assert_eq!(json["links"]["self"]["href"], "localhost:5000/api/v1/jobs");
    assert!(json["links"].get("next").is_none());
}

#[tokio::test]
async fn test_list_not_modified_on_matching_etag() {
    let router = router();
    let first = send(&router, Method::GET, "/api/v1/jobs", &[]).await;
    let etag = first.headers["ETag"].clone();

    let second = send(&router, Method::GET, "/api/v1/jobs", &[("If-None-Match", etag.as_str())]).await;
    assert_eq!(second.status, StatusCode::NotModified);
    assert!(second.body.is_empty());
    assert_eq!(second.headers["ETag"], etag);
}

#[tokio::test]
async fn test_list_pagination_links() {
    let router = router();
    let response = send(&router, Method::GET, "/api/v1/people?max_results=2&sort=name", &[]).await;

    let json = body(&response);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["name"], "ann");
    assert_eq!(
        json["links"]["next"]["href"],
        "localhost:5000/api/v1/people?max_results=2&sort=name&page=2"
    );
    assert_eq!(json["links"]["last"]["href"], json["links"]["next"]["href"]);
    assert!(json["links"].get("prev").is_none());

    let response = send(&router, Method::GET, "/api/v1/people?max_results=2&sort=name&page=2", &[]).await;
    let json = body(&response);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["name"], "cid");
    assert!(json["links"].get("prev").is_some());
    assert!(json["links"].get("next").is_none());
}

#[tokio::test]
async fn test_list_where_filter() {
    let router = router();
    let response = send(&router, Method::GET, "/api/v1/people?where=%7B%22name%22%3A%22ben%22%7D", &[]).await;

    let json = body(&response);
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["name"], "ben");
}

#[tokio::test]
async fn test_bad_where_is_rejected() {
    let router = router();

    let disallowed = send(&router, Method::GET, "/api/v1/people?where=%7B%22secret%22%3A1%7D", &[]).await;
    assert_eq!(disallowed.status, StatusCode::BadRequest);
    assert_eq!(body(&disallowed)["error"]["code"], 400);

    let garbage = send(&router, Method::GET, "/api/v1/people?where=nope", &[]).await;
    assert_eq!(garbage.status, StatusCode::BadRequest);
}

#[tokio::test]
async fn test_get_item_by_lookup_field() {
    let router = router();
    let response = send(&router, Method::GET, "/api/v1/jobs/pie", &[]).await;

    assert_eq!(response.status, StatusCode::Ok);
    let json = body(&response);
    assert_eq!(json["items"][0]["user"], "pie");
    assert_eq!(json["items"][0]["etag"], response.headers["ETag"].as_str());
    assert_eq!(json["links"]["self"]["title"], "job");
    assert_eq!(json["links"]["self"]["href"], "localhost:5000/api/v1/jobs/pie");
    assert_eq!(json["links"]["collection"]["href"], "localhost:5000/api/v1/jobs");
}

#[tokio::test]
async fn test_get_item_by_object_id() {
    let router = router();
    let list = body(&send(&router, Method::GET, "/api/v1/people?where=%7B%22name%22%3A%22ann%22%7D", &[]).await);
    let id = list["items"][0]["_id"].as_str().unwrap().to_string();

    let response = send(&router, Method::GET, &format!("/api/v1/people/{}", id), &[]).await;
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(body(&response)["items"][0]["name"], "ann");
}

#[tokio::test]
async fn test_get_item_conditional() {
    let router = router();

    let unchanged = send(&router, Method::GET, "/api/v1/jobs/pie", &[("If-Modified-Since", EPOCH)]).await;
    assert_eq!(unchanged.status, StatusCode::NotModified);
    assert_eq!(unchanged.headers["Last-Modified"], EPOCH);

    let stale_tag = send(&router, Method::GET, "/api/v1/jobs/pie", &[("If-None-Match", "nope")]).await;
    assert_eq!(stale_tag.status, StatusCode::Ok);
}

#[tokio::test]
async fn test_if_modified_since_at_end_of_time_is_ignored() {
    let router = router();
    let response = send(
        &router,
        Method::GET,
        "/api/v1/jobs/pie",
        &[("If-Modified-Since", "Mon, 31 Dec +262142 23:59:59 GMT")],
    )
    .await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(body(&response)["items"][0]["user"], "pie");
}

#[tokio::test]
async fn test_item_ids_are_percent_decoded_and_reencoded() {
    let cfg = Config::from_yaml_str(
        "datastore:\n  seed:\n    jobs:\n      - user: big job?\ndomain:\n  jobs:\n    item_lookup_field: user\n",
    )
    .unwrap();
    let router = Router::new(&cfg, Arc::new(MemoryDatastore::seeded(&cfg.datastore.seed)));

    let response = send(&router, Method::GET, "/jobs/big%20job%3F", &[]).await;
    assert_eq!(response.status, StatusCode::Ok);

    let json = body(&response);
    assert_eq!(json["items"][0]["user"], "big job?");
    assert_eq!(json["links"]["self"]["href"], "/jobs/big%20job%3F");
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    let router = router();

    for path in ["/api/v1/jobs/nobody", "/api/v1/unknown", "/jobs", "/api/v1/jobs/pie/extra", "/api/v1x"] {
        let response = send(&router, Method::GET, path, &[]).await;
        assert_eq!(response.status, StatusCode::NotFound, "{path}");
    }
}

#[tokio::test]
async fn test_disallowed_methods() {
    let router = router();

    assert_eq!(
        send(&router, Method::POST, "/api/v1/jobs", &[]).await.status,
        StatusCode::MethodNotAllowed
    );
    assert_eq!(
        send(&router, Method::DELETE, "/api/v1/people/abc", &[]).await.status,
        StatusCode::MethodNotAllowed
    );
    assert_eq!(
        send(&router, Method::PUT, "/api/v1", &[]).await.status,
        StatusCode::MethodNotAllowed
    );
}

#[tokio::test]
async fn test_home_lists_resources() {
    let router = router();
    let response = send(&router, Method::GET, "/api/v1", &[]).await;

    assert_eq!(response.status, StatusCode::Ok);
    let json = body(&response);
    let children = json["links"]["child"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["title"], "people");
    assert_eq!(children[0]["href"], "localhost:5000/api/v1/people");
    assert_eq!(children[1]["title"], "jobs");
}

#[tokio::test]
async fn test_delete_honours_if_match() {
    let router = router();
    let current = send(&router, Method::GET, "/api/v1/jobs/hanso", &[]).await;
    let etag = current.headers["ETag"].clone();

    let stale = send(&router, Method::DELETE, "/api/v1/jobs/hanso", &[("If-Match", "stale")]).await;
    assert_eq!(stale.status, StatusCode::PreconditionFailed);
    assert_eq!(
        send(&router, Method::GET, "/api/v1/jobs/hanso", &[]).await.status,
        StatusCode::Ok
    );

    let deleted = send(&router, Method::DELETE, "/api/v1/jobs/hanso", &[("If-Match", etag.as_str())]).await;
    assert_eq!(deleted.status, StatusCode::NoContent);
    assert!(deleted.body.is_empty());
    assert_eq!(
        send(&router, Method::GET, "/api/v1/jobs/hanso", &[]).await.status,
        StatusCode::NotFound
    );
}

/// Never answers within the configured timeout.
struct Stalled;

#[async_trait]
impl Datastore for Stalled {
    async fn find(&self, _source: &str, _query: &FindQuery) -> Result<Vec<Document>, DatastoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn count(&self, _source: &str, _filter: &Filter) -> Result<u64, DatastoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(0)
    }

    async fn remove(&self, _source: &str, _filter: &Filter) -> Result<u64, DatastoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_datastore_timeout_is_gateway_timeout() {
    let cfg = Config::from_yaml_str("datastore:\n  timeout_ms: 20\ndomain:\n  jobs: {}\n").unwrap();
    let router = Router::new(&cfg, Arc::new(Stalled));

    let response = send(&router, Method::GET, "/jobs", &[]).await;
    assert_eq!(response.status, StatusCode::GatewayTimeout);
    assert_eq!(body(&response)["error"]["code"], 504);
}
