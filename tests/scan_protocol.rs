mod common;

use access_audit::{
    backend::{ScanBackend, http::HttpBackend},
    client::{ScanClient, ThreadSleeper},
    config::Config,
    error::ScanError,
    token::TokenExtractor,
};
use common::{FailAt, FakeBackend, RecordingSleeper, req};
use mockito::Matcher;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(40);

fn client<'a, B: ScanBackend>(
    backend: B,
    sleeper: &'a RecordingSleeper,
) -> ScanClient<B, &'a RecordingSleeper> {
    let tokens = TokenExtractor::new(&Config::default().backend.token_pattern).unwrap();
    ScanClient::new(backend, sleeper, tokens, WAIT)
}

#[test]
fn runs_steps_in_order_and_waits_once() {
    let backend = FakeBackend::default();
    let sleeper = RecordingSleeper::default();
    let mut progress = Vec::new();

    let doc = client(&backend, &sleeper)
        .scan(&req("https://example.org/a"), &mut |m: &str| {
            progress.push(m.to_string())
        })
        .expect("scan succeeds");

    assert_eq!(doc.value()["scanStatus"], "success");
    assert_eq!(
        backend.calls(),
        vec![
            "loading https://example.org/a",
            "evaluate https://example.org/a tok-1",
            "details tok-1",
        ]
    );
    assert_eq!(sleeper.total(), vec![WAIT]);
    assert_eq!(
        progress,
        vec![
            "Getting token for https://example.org/a",
            "Starting evaluation for https://example.org/a",
            "Waiting for scan to complete for https://example.org/a",
            "Retrieving results for https://example.org/a",
        ]
    );
}

#[test]
fn acquire_failure_stops_before_evaluate() {
    let backend = FakeBackend::default().fail("https://example.org/a", FailAt::Acquire);
    let sleeper = RecordingSleeper::default();
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/a"), &mut |_: &str| {})
        .unwrap_err();

    assert!(matches!(err, ScanError::AcquireFailure { .. }));
    assert_eq!(backend.calls().len(), 1);
    assert!(sleeper.total().is_empty());
}

#[test]
fn missing_token_is_distinct_from_transport_failure() {
    let backend = FakeBackend::default().fail("https://example.org/a", FailAt::NoToken);
    let sleeper = RecordingSleeper::default();
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/a"), &mut |_: &str| {})
        .unwrap_err();

    assert!(matches!(err, ScanError::TokenMissing { ref url } if url == "https://example.org/a"));
    assert_eq!(err.kind(), "token_missing");
    assert_eq!(backend.calls().len(), 1);
}

#[test]
fn trigger_failure_abandons_scan_without_waiting() {
    let backend = FakeBackend::default().fail("https://example.org/a", FailAt::Trigger);
    let sleeper = RecordingSleeper::default();
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/a"), &mut |_: &str| {})
        .unwrap_err();

    assert!(matches!(err, ScanError::TriggerFailure { .. }));
    assert_eq!(backend.calls().len(), 2);
    assert!(sleeper.total().is_empty());
}

#[test]
fn fetch_and_decode_failures() {
    let sleeper = RecordingSleeper::default();

    let backend = FakeBackend::default().fail("https://example.org/a", FailAt::Fetch);
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/a"), &mut |_: &str| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::FetchFailure { ref token, .. } if token == "tok-1"));

    let backend = FakeBackend::default().fail("https://example.org/b", FailAt::Garbage);
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/b"), &mut |_: &str| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::DecodeFailure { .. }));

    let backend = FakeBackend::default().with_details("https://example.org/c", "[1, 2]");
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/c"), &mut |_: &str| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::DecodeFailure { .. }));
}

#[test]
fn empty_details_object_is_a_decode_failure() {
    let sleeper = RecordingSleeper::default();
    let backend = FakeBackend::default().with_details("https://example.org/d", " {} ");
    let err = client(&backend, &sleeper)
        .scan(&req("https://example.org/d"), &mut |_: &str| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::DecodeFailure { ref token, .. } if token == "tok-1"));
    assert_eq!(sleeper.total(), vec![WAIT]);
}

fn http_config(server: &mockito::Server) -> Config {
    let mut cfg = Config::default();
    cfg.backend.base_url = server.url();
    cfg.backend.request_timeout_seconds = 5;
    cfg
}

#[test]
fn http_backend_speaks_the_three_endpoints() {
    let mut server = mockito::Server::new();
    let cfg = http_config(&server);

    let loading = server
        .mock("GET", Matcher::Regex("^/loading".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("website".into(), "https://example.org/a b?x=1".into()),
            Matcher::UrlEncoded("isPartner".into(), "false".into()),
            Matcher::UrlEncoded("embedder".into(), "accessibe.com".into()),
        ]))
        .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".into()))
        .with_status(200)
        .with_body(r#"<section data-token="tok-42"></section>"#)
        .create();
    let evaluate = server
        .mock("GET", Matcher::Regex("^/evaluate".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("website".into(), "https://example.org/a b?x=1".into()),
            Matcher::UrlEncoded("screenshot".into(), "true".into()),
            Matcher::UrlEncoded("token".into(), "tok-42".into()),
        ]))
        .with_status(200)
        .with_body("{}")
        .create();
    let details = server
        .mock("GET", Matcher::Regex("^/get-scan-details".into()))
        .match_query(Matcher::UrlEncoded("scanId".into(), "tok-42".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"scanStatus":"success","result":{"verdict":"pass","score":88}}"#)
        .create();

    let backend = HttpBackend::new(&cfg).unwrap();
    let tokens = TokenExtractor::new(&cfg.backend.token_pattern).unwrap();
    let client = ScanClient::new(backend, ThreadSleeper, tokens, Duration::ZERO);
    let doc = client
        .scan(&req("https://example.org/a b?x=1"), &mut |_: &str| {})
        .expect("scan succeeds");

    loading.assert();
    evaluate.assert();
    details.assert();
    assert_eq!(doc.value()["result"]["score"], 88);
}

#[test]
fn http_status_errors_map_to_protocol_steps() {
    let mut server = mockito::Server::new();
    let cfg = http_config(&server);
    let _loading = server
        .mock("GET", Matcher::Regex("^/loading".into()))
        .with_status(200)
        .with_body(r#"<i data-token="t1"></i>"#)
        .create();
    let _evaluate = server
        .mock("GET", Matcher::Regex("^/evaluate".into()))
        .with_status(500)
        .create();

    let backend = HttpBackend::new(&cfg).unwrap();
    let tokens = TokenExtractor::new(&cfg.backend.token_pattern).unwrap();
    let client = ScanClient::new(backend, ThreadSleeper, tokens, Duration::ZERO);
    let err = client
        .scan(&req("https://example.org/"), &mut |_: &str| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::TriggerFailure { .. }));

    let mut server = mockito::Server::new();
    let cfg = http_config(&server);
    let _loading = server
        .mock("GET", Matcher::Regex("^/loading".into()))
        .with_status(404)
        .create();
    let backend = HttpBackend::new(&cfg).unwrap();
    let err = backend.loading_page(&req("https://example.org/")).unwrap_err();
    assert!(matches!(err, ScanError::AcquireFailure { .. }));
}
