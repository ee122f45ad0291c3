//! Retry, backoff and error classification tests.
//!
//! Backoff delays are captured by a recording sleeper, so no test waits on
//! the wall clock for them.

mod common;

use std::time::Duration;

use anyhow::Result;
use intelligentdata::{AddressRequest, Error, IntelligentDataClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{RecordingSleeper, api_key_client, builder_for, secs};

const ADDRESS: &str = "/api/validate/address";

fn address() -> AddressRequest {
    AddressRequest::new("123 Main St", "New York", "US")
}

#[tokio::test]
async fn test_rate_limit_then_success_sleeps_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isValid": true})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let result = client.validate_address(address()).await?;
    assert!(result.is_valid);
    assert_eq!(sleeper.sleeps(), secs(&[1]));

    Ok(())
}

#[tokio::test]
async fn test_rate_limit_exhaustion_reports_last_retry_after() -> Result<()> {
    let server = MockServer::start().await;
    for (priority, retry_after) in [(1u8, "1"), (2, "2"), (3, "3")] {
        Mock::given(method("POST"))
            .and(path(ADDRESS))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", retry_after)
                    .set_body_json(json!({"message": "quota"})),
            )
            .up_to_n_times(1)
            .with_priority(priority)
            .expect(1)
            .mount(&server)
            .await;
    }

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    match &err {
        Error::RateLimit {
            retry_after,
            envelope,
        } => {
            assert_eq!(*retry_after, Duration::from_secs(3));
            assert_eq!(envelope.status_code, 429);
            assert_eq!(envelope.raw_body, json!({"message": "quota"}));
        }
        other => panic!("expected rate limit error, got {:?}", other),
    }
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_rate_limit_without_header_uses_backoff() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "soon"))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(4)));
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_unauthorized_fails_without_retry() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad key"})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    match &err {
        Error::Auth(env) => {
            assert_eq!(env.status_code, 401);
            assert_eq!(env.message, "bad key");
            assert_eq!(env.raw_body, json!({"message": "bad key"}));
        }
        other => panic!("expected auth error, got {:?}", other),
    }
    assert!(sleeper.sleeps().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_forbidden_fails_without_retry() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.envelope().message, "Authentication failed");
    assert!(sleeper.sleeps().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_client_error_fails_without_retry() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "country is required"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    match &err {
        Error::Api(env) => {
            assert_eq!(env.status_code, 422);
            assert_eq!(env.message, "country is required");
        }
        other => panic!("expected api error, got {:?}", other),
    }
    assert!(sleeper.sleeps().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unparseable_error_body_degrades_to_default_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let env = client.validate_address(address()).await.unwrap_err().envelope();
    assert_eq!(env.status_code, 404);
    assert_eq!(env.message, "Request failed");
    assert_eq!(env.raw_body, json!("<html>nope</html>"));

    Ok(())
}

#[tokio::test]
async fn test_server_error_then_success() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isValid": true})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    assert!(client.validate_address(address()).await?.is_valid);
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_server_error_exhaustion() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = api_key_client(&server, &sleeper);

    let err = client.validate_address(address()).await.unwrap_err();
    match &err {
        Error::Server(env) => {
            assert_eq!(env.status_code, 500);
            assert_eq!(env.message, "boom");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() -> Result<()> {
    let sleeper = RecordingSleeper::new();
    let client = IntelligentDataClient::builder()
        .base_url("http://127.0.0.1:1")
        .api_key("svm_test_key")
        .sleeper(sleeper.clone())
        .build()?;

    let err = client.validate_address(address()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {:?}", err);
    assert!(err.is_retryable());
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_timeout_is_transport_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isValid": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = builder_for(&server, &sleeper)
        .api_key("svm_test_key")
        .timeout(Duration::from_millis(100))
        .build()?;

    let err = client.validate_address(address()).await.unwrap_err();
    match &err {
        Error::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(sleeper.sleeps(), secs(&[1, 2]));

    Ok(())
}

#[tokio::test]
async fn test_custom_retry_policy() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADDRESS))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = builder_for(&server, &sleeper)
        .api_key("svm_test_key")
        .retry_policy(intelligentdata::RetryPolicy::new(1, Duration::from_millis(250)))
        .build()?;

    let err = client.validate_address(address()).await.unwrap_err();
    assert!(err.is_server_error());
    assert!(sleeper.sleeps().is_empty());

    Ok(())
}
