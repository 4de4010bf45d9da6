use std::sync::Arc;

use restling::config::Config;
use restling::datastore::MemoryDatastore;
use restling::http::connection::Connection;
use restling::rest::router::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

fn router() -> Arc<Router> {
    let cfg = Config::from_yaml_str(
        "datastore:\n  seed:\n    jobs:\n      - user: pie\ndomain:\n  jobs:\n    item_lookup_field: user\n",
    )
    .unwrap();
    let store = Arc::new(MemoryDatastore::seeded(&cfg.datastore.seed));
    Arc::new(Router::new(&cfg, store))
}

async fn exchange(raw: &[u8]) -> String {
    let (mut client, server) = duplex(64 * 1024);
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, router());
        conn.run().await
    });

    client.write_all(raw).await.unwrap();
    client.shutdown().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_serves_item_and_closes() {
    let out = exchange(b"GET /jobs/pie HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert!(out.contains("Content-Type: application/json\r\n"));
    assert!(out.contains("\"user\":\"pie\""));
}

#[tokio::test]
async fn test_keep_alive_serves_pipelined_requests() {
    let out = exchange(b"GET /jobs/pie HTTP/1.1\r\n\r\nGET /jobs/nobody HTTP/1.1\r\n\r\n").await;

    assert_eq!(out.matches("HTTP/1.1 ").count(), 2);
    assert!(out.contains("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_malformed_request_gets_bad_request() {
    let out = exchange(b"BREW /pot HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("\"code\":400"));
}

#[tokio::test]
async fn test_not_modified_has_no_body() {
    let first = exchange(b"GET /jobs/pie HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    let etag = first
        .lines()
        .find_map(|line| line.strip_prefix("ETag: "))
        .unwrap()
        .to_string();

    let request = format!("GET /jobs/pie HTTP/1.1\r\nIf-None-Match: {}\r\nConnection: close\r\n\r\n", etag);
    let out = exchange(request.as_bytes()).await;

    assert!(out.starts_with("HTTP/1.1 304 Not Modified\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
}
