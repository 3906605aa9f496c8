//! Integration tests for the HTTP fact client against a mock upstream

use fact_archive::{
    ArchiveConfig, ArchiveStore, CycleOutcome, FactCollector, FactSource, FetchError,
    FetcherConfig, UselessFactsClient,
};
use mockito::Matcher;
use std::sync::Arc;

const FACT_PATH: &str = "/api/v2/facts/random";

fn fact_body(text: &str) -> String {
    serde_json::json!({
        "id": "5c0f6b1c",
        "text": text,
        "source": "djtech.net",
        "source_url": "http://www.djtech.net/humor/useless_facts.htm",
        "language": "en",
        "permalink": "https://uselessfacts.jsph.pl/api/v2/facts/5c0f6b1c"
    })
    .to_string()
}

fn client_for(server: &mockito::ServerGuard) -> UselessFactsClient {
    let mut config = FetcherConfig::with_base_url(server.url());
    config.retry_backoff_ms = 10;
    UselessFactsClient::new(config).unwrap()
}

#[tokio::test]
async fn test_fetch_maps_response_to_fact() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::UrlEncoded("language".into(), "en".into()))
        .match_header("user-agent", Matcher::Regex("^fact-archive/".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(fact_body("A group of flamingos is called a flamboyance."))
        .create_async()
        .await;

    let fact = client_for(&server).fetch().await.unwrap();

    assert_eq!(fact.text, "A group of flamingos is called a flamboyance.");
    assert_eq!(fact.source, "http://www.djtech.net/humor/useless_facts.htm");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_configured_language_is_requested() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::UrlEncoded("language".into(), "de".into()))
        .with_status(200)
        .with_body(fact_body("A"))
        .create_async()
        .await;

    let mut config = FetcherConfig::with_base_url(server.url());
    config.language = Some("de".to_string());
    let client = UselessFactsClient::new(config).unwrap();

    assert!(client.fetch().await.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_text_is_format_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id": "x", "source_url": "http://example.com"}"#)
        .create_async()
        .await;

    let err = client_for(&server).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::MissingField("text")));
    assert!(err.is_format_error());
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client_for(&server).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("not found")
        .expect(1)
        .create_async()
        .await;

    let mut config = FetcherConfig::with_base_url(server.url());
    config.retry_attempts = 3;
    config.retry_backoff_ms = 10;
    let err = UselessFactsClient::new(config).unwrap().fetch().await.unwrap_err();

    match err {
        FetchError::UpstreamStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("Expected UpstreamStatus, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let mut config = FetcherConfig::with_base_url(server.url());
    config.retry_attempts = 2;
    config.retry_backoff_ms = 10;
    let err = UselessFactsClient::new(config).unwrap().fetch().await.unwrap_err();

    assert!(matches!(err, FetchError::UpstreamStatus { status: 503, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_host_is_request_failure() {
    let mut config = FetcherConfig::with_base_url("http://127.0.0.1:1");
    config.timeout_ms = 2000;
    let err = UselessFactsClient::new(config).unwrap().fetch().await.unwrap_err();

    assert!(matches!(
        err,
        FetchError::RequestFailed(_) | FetchError::Timeout(_)
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_cycle_against_mock_api() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(fact_body("Octopuses have three hearts."))
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArchiveStore::new(ArchiveConfig::at(dir.path().join("facts.json")));
    let collector = FactCollector::new(Arc::new(client_for(&server)), store);

    assert!(collector.run_cycle().await.unwrap().is_added());
    assert!(matches!(
        collector.run_cycle().await.unwrap(),
        CycleOutcome::Duplicate(_)
    ));
    assert_eq!(collector.archive().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cycle_reports_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FACT_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("facts.json");
    let collector = FactCollector::new(
        Arc::new(client_for(&server)),
        ArchiveStore::new(ArchiveConfig::at(&path)),
    );

    let outcome = collector.run_cycle().await.unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::FetchFailed(FetchError::UpstreamStatus { status: 500, .. })
    ));
    assert!(!path.exists());
}
