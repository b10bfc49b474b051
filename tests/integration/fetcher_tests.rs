//! Retry, redirect and request-shape behavior of the HTTP client

use catalog_crawler::config::{HttpConfig, TargetConfig};
use catalog_crawler::crawler::{NetworkFailure, RetryingHttpClient};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_client() -> RetryingHttpClient {
    let http = HttpConfig {
        timeout_secs: 5,
        backoff_factor: 0.0,
        ..HttpConfig::default()
    };
    RetryingHttpClient::new(&TargetConfig::default(), &http).expect("Failed to build client")
}

#[tokio::test]
async fn test_gives_up_after_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instavel"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let url = format!("{}/instavel", server.uri());
    let result = quick_client().get(&url, &[]).await;

    match result {
        Err(NetworkFailure::RetriesExhausted {
            attempts, status, ..
        }) => {
            assert_eq!(attempts, 4);
            assert_eq!(status, 503);
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recovers_after_transient_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagina"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pagina"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/pagina", server.uri());
    let response = quick_client().get(&url, &[]).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/removido"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/removido", server.uri());
    let response = quick_client().get(&url, &[]).await.unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_sends_query_params_and_user_agent() {
    let server = MockServer::start().await;
    let target = TargetConfig {
        user_agent: "catalog-crawler-test/1.0".to_string(),
        ..TargetConfig::default()
    };

    Mock::given(method("GET"))
        .and(path("/busca/monitor/"))
        .and(query_param("page", "2"))
        .and(query_param("sortType", "price"))
        .and(header("user-agent", target.user_agent.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/busca/monitor/", server.uri());
    let params = [("page", "2".to_string()), ("sortType", "price".to_string())];
    let client = RetryingHttpClient::new(&target, &HttpConfig::default()).unwrap();
    let response = client.get(&url, &params).await.unwrap();

    assert!(response.is_success());
}

#[tokio::test]
async fn test_reports_final_url_after_redirect() {
    let server = MockServer::start().await;
    let destination = format!("{}/produto/p/abc123/", server.uri());

    Mock::given(method("GET"))
        .and(path("/atalho"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", destination.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/produto/p/abc123/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/atalho", server.uri());
    let response = quick_client().get(&url, &[]).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, destination);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lento"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let http = HttpConfig {
        max_retries: 0,
        ..HttpConfig::default()
    };
    let client = RetryingHttpClient::new(&TargetConfig::default(), &http).unwrap();
    let url = format!("{}/lento", server.uri());
    let result = client
        .get_with_timeout(&url, &[], Duration::from_millis(200))
        .await;

    assert!(matches!(result, Err(NetworkFailure::Timeout { .. })));
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oscilante"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oscilante"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/oscilante", server.uri());
    let response = quick_client()
        .get_with_timeout(&url, &[], Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "ok");
}
