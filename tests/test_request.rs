use restling::http::request::{Method, Request, RequestBuilder};
use restling::rest::request::RequestSource;

fn get(path: &str) -> RequestBuilder {
    RequestBuilder::new().method(Method::GET).path(path)
}

#[test]
fn test_request_header_lookup_ignores_case() {
    let req = get("/jobs")
        .header("If-None-Match", "abc")
        .header("Content-Type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("if-none-match"), Some("abc"));
    assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_first_duplicate_header_wins() {
    let req = get("/jobs")
        .header("If-Match", "first")
        .header("if-match", "second")
        .build()
        .unwrap();

    assert_eq!(req.header("If-Match"), Some("first"));
    assert_eq!(req.header_value("If-Match"), Some("first"));
}

#[test]
fn test_request_keep_alive_http11_default() {
    let req = get("/").build().unwrap();

    assert!(req.keep_alive());
}

#[test]
fn test_request_keep_alive_http10_default() {
    let req = get("/").version("HTTP/1.0").build().unwrap();

    assert!(!req.keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    let req = get("/").header("Connection", "close").build().unwrap();

    assert!(!req.keep_alive());
}

#[test]
fn test_request_keep_alive_case_insensitive() {
    let req = get("/").header("connection", "Keep-Alive").build().unwrap();

    assert!(req.keep_alive());
}

#[test]
fn test_request_route_and_query() {
    let req = get("/jobs?sort=-user&max_results=10").build().unwrap();

    assert_eq!(req.route(), "/jobs");
    assert_eq!(req.query_string(), Some("sort=-user&max_results=10"));
    assert_eq!(
        req.query_pairs(),
        vec![
            ("sort".to_string(), "-user".to_string()),
            ("max_results".to_string(), "10".to_string()),
        ]
    );
}

#[test]
fn test_request_without_query() {
    let req = get("/jobs").build().unwrap();

    assert_eq!(req.route(), "/jobs");
    assert_eq!(req.query_string(), None);
    assert!(req.query_pairs().is_empty());
}

#[test]
fn test_request_query_plus_decodes_to_space() {
    let req = get("/jobs?where=%7B%22name%22%3A+%22a+b%22%7D").build().unwrap();

    assert_eq!(req.query_pairs()[0].1, r#"{"name": "a b"}"#);
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("DELETE"), Some(Method::DELETE));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
    assert_eq!(Method::DELETE.as_str(), "DELETE");
}

#[test]
fn test_request_source_exposes_raw_headers() {
    let req: Request = get("/").header("X-A", "1").build().unwrap();

    assert_eq!(req.header_pairs(), &[("X-A".to_string(), "1".to_string())]);
}
