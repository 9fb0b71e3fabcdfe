//! Tests for header/parameter parsing and applying overrides.

use crate::cli::args::{split_header, split_param, RequestArgs};
use hrq_core::config::Defaults;
use hrq_core::{Method, RequestBuilder};
use std::time::Duration;

#[test]
fn header_is_split_on_first_colon() {
    assert_eq!(split_header("X-Time: 12:30").unwrap(), ("X-Time", "12:30"));
    assert!(split_header("no-colon").is_err());
    assert!(split_header(": value").is_err());
}

#[test]
fn param_is_split_on_first_equals() {
    assert_eq!(split_param("q=a=b").unwrap(), ("q", "a=b"));
    assert_eq!(split_param("empty=").unwrap(), ("empty", ""));
    assert!(split_param("=1").is_err());
    assert!(split_param("flag").is_err());
}

#[test]
fn overrides_reach_descriptor() {
    let args = RequestArgs {
        headers: vec!["X-App: hrq".into()],
        params: vec!["q=1".into()],
        timeout_ms: Some(1500),
        retries: Some(2),
        backoff: Some(2.0),
        encoding: Some("latin1".into()),
    };
    let builder = RequestBuilder::with_defaults(Defaults::default(), Method::Get, "http://x/api");
    let desc = args.apply(builder).unwrap().build();
    assert_eq!(desc.headers()["X-App"], "hrq");
    assert_eq!(desc.final_url().unwrap(), "http://x/api?q=1");
    assert_eq!(desc.policy().initial_timeout, Duration::from_millis(1500));
    assert_eq!(desc.policy().max_retries, 2);
    assert_eq!(desc.encoding().name(), "windows-1252");
}

#[test]
fn unknown_encoding_is_rejected() {
    let args = RequestArgs {
        encoding: Some("no-such-charset".into()),
        ..RequestArgs::default()
    };
    let builder = RequestBuilder::with_defaults(Defaults::default(), Method::Get, "http://x/api");
    assert!(args.apply(builder).is_err());
}

#[test]
fn non_positive_backoff_is_rejected() {
    let args = RequestArgs {
        backoff: Some(-1.5),
        ..RequestArgs::default()
    };
    let builder = RequestBuilder::with_defaults(Defaults::default(), Method::Get, "http://x/api");
    assert!(args.apply(builder).is_err());
}
