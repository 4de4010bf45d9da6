use chrono::{Duration, NaiveDate, NaiveDateTime};
use restling::rest::conditional::{Freshness, evaluate, precondition_holds};
use restling::rest::request::ParsedRequest;

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 4, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

#[test]
fn test_matching_etag_is_unchanged_regardless_of_date() {
    let req = ParsedRequest {
        if_none_match: Some("abc123".to_string()),
        if_modified_since: Some(noon() - Duration::days(30)),
        ..Default::default()
    };

    assert_eq!(evaluate(&req, noon(), "abc123"), Freshness::Unchanged);
}

#[test]
fn test_etag_comparison_is_case_sensitive() {
    let req = ParsedRequest {
        if_none_match: Some("ABC123".to_string()),
        ..Default::default()
    };

    assert_eq!(evaluate(&req, noon(), "abc123"), Freshness::Modified);
}

#[test]
fn test_mismatched_etag_falls_through_to_date() {
    let req = ParsedRequest {
        if_none_match: Some("other".to_string()),
        if_modified_since: Some(noon() + Duration::seconds(1)),
        ..Default::default()
    };

    assert_eq!(evaluate(&req, noon(), "abc123"), Freshness::Unchanged);
}

#[test]
fn test_if_modified_since_boundaries() {
    let since = |t| ParsedRequest {
        if_modified_since: Some(t),
        ..Default::default()
    };

    // equal is not strictly greater
    assert_eq!(evaluate(&since(noon()), noon(), "x"), Freshness::Unchanged);
    assert_eq!(evaluate(&since(noon() - Duration::seconds(1)), noon(), "x"), Freshness::Modified);
}

#[test]
fn test_sub_second_save_is_not_modified() {
    // Saved at 12:00:00.400, client saw "12:00:00 GMT" and sends it back.
    let saved = noon() + Duration::milliseconds(400);
    let req = ParsedRequest {
        if_modified_since: Some(noon() + Duration::seconds(1)),
        ..Default::default()
    };

    assert_eq!(evaluate(&req, saved, "x"), Freshness::Unchanged);
}

#[test]
fn test_no_validators_means_modified() {
    assert_eq!(evaluate(&ParsedRequest::default(), noon(), "x"), Freshness::Modified);
}

#[test]
fn test_if_match_precondition() {
    let with = |tag: &str| ParsedRequest {
        if_match: Some(tag.to_string()),
        ..Default::default()
    };

    assert!(precondition_holds(&ParsedRequest::default(), "abc"));
    assert!(precondition_holds(&with("abc"), "abc"));
    assert!(!precondition_holds(&with("stale"), "abc"));
}
