use super::*;
use crate::config::ClientCredentials;
use chrono::Duration as ChronoDuration;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint_for(server: &MockServer) -> TokenEndpointClient {
    let credentials = ClientCredentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost:3000/integrations/hubspot/oauth2callback".to_string(),
    };
    TokenEndpointClient::new(&server.uri(), credentials, Duration::from_secs(5)).unwrap()
}

fn record(access: &str, refresh: &str, expires_in_secs: i64) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() + ChronoDuration::seconds(expires_in_secs),
    }
}

fn broker_with(server: &MockServer, initial: Option<TokenRecord>) -> TokenBroker {
    let store = TokenStore::new();
    if let Some(initial) = initial {
        store.set(initial);
    }
    TokenBroker::with_store(store, endpoint_for(server))
}

fn refresh_grant(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token_type": "bearer",
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 1800
    }))
}

async fn mount_no_token_calls(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_valid_token_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_no_token_calls(&server).await;

    let broker = broker_with(&server, Some(record("cached", "rt", 600)));
    assert_eq!(broker.state(), TokenState::Valid);
    assert_eq!(broker.get_valid_token().await.unwrap(), "cached");
    assert_eq!(broker.get_valid_token().await.unwrap(), "cached");
}

#[tokio::test]
async fn test_unauthenticated_fails_without_network() {
    let server = MockServer::start().await;
    mount_no_token_calls(&server).await;

    let broker = broker_with(&server, None);
    assert_eq!(broker.state(), TokenState::Unauthenticated);
    assert!(matches!(
        broker.get_valid_token().await,
        Err(GatewayError::NotAuthenticated)
    ));
    assert!(matches!(
        broker.force_refresh().await,
        Err(GatewayError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_expired_token_refreshes_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-old"))
        .respond_with(refresh_grant("at-new", "rt-new"))
        .expect(1)
        .mount(&server)
        .await;

    let stale = record("at-old", "rt-old", -10);
    let old_expiry = stale.expires_at;
    let broker = broker_with(&server, Some(stale));
    assert_eq!(broker.state(), TokenState::Expired);

    assert_eq!(broker.get_valid_token().await.unwrap(), "at-new");

    let current = broker.current_record().unwrap();
    assert_eq!(current.refresh_token, "rt-new");
    assert!(current.expires_at > old_expiry);
    assert_eq!(broker.state(), TokenState::Valid);

    // Now valid again; served from cache
    assert_eq!(broker.get_valid_token().await.unwrap(), "at-new");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(refresh_grant("at-new", "rt-new").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", -10)));

    let calls = (0..10).map(|_| broker.get_valid_token());
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap(), "at-new");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(refresh_grant("at-new", "rt-new").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let broker = Arc::new(broker_with(&server, Some(record("at-old", "rt-old", -10))));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.get_valid_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "at-new");
    }
}

#[tokio::test]
async fn test_refresh_failure_is_shared_and_keeps_stale_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "BAD_REFRESH_TOKEN", "message": "revoked"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", -10)));

    let calls = (0..5).map(|_| broker.get_valid_token());
    let results = futures::future::join_all(calls).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "token_refresh_failed");
        assert_eq!(err.upstream_status(), Some(400));
        assert_eq!(
            err.upstream_body(),
            Some(&json!({"status": "BAD_REFRESH_TOKEN", "message": "revoked"}))
        );
    }

    let kept = broker.current_record().unwrap();
    assert_eq!(kept.access_token, "at-old");
    assert_eq!(kept.refresh_token, "rt-old");
    assert_eq!(broker.state(), TokenState::Expired);
}

#[tokio::test]
async fn test_refresh_retried_after_failure() {
    let server = MockServer::start().await;

    // First match wins until exhausted
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(refresh_grant("at-new", "rt-new"))
        .expect(1)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", -10)));

    assert!(broker.get_valid_token().await.is_err());
    assert_eq!(broker.get_valid_token().await.unwrap(), "at-new");
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-new",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-keep", -10)));
    broker.get_valid_token().await.unwrap();
    assert_eq!(broker.current_record().unwrap().refresh_token, "rt-keep");
}

#[tokio::test]
async fn test_force_refresh_while_valid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(refresh_grant("at-forced", "rt-forced"))
        .expect(1)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", 600)));
    let refreshed = broker.force_refresh().await.unwrap();

    assert_eq!(refreshed.access_token, "at-forced");
    assert_eq!(broker.get_valid_token().await.unwrap(), "at-forced");
}

#[tokio::test]
async fn test_exchange_then_get_makes_no_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "bearer",
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(refresh_grant("unused", "unused"))
        .expect(0)
        .mount(&server)
        .await;

    let broker = broker_with(&server, None);
    let exchange = broker.exchange_code("abc").await.unwrap();

    assert_eq!(exchange.expires_in, 1800);
    assert_eq!(exchange.record.access_token, "at-1");
    assert_eq!(exchange.record.refresh_token, "rt-1");
    assert_eq!(broker.get_valid_token().await.unwrap(), "at-1");
}

#[tokio::test]
async fn test_failed_exchange_leaves_store_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"status": "BAD_AUTH_CODE"})),
        )
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", 600)));
    let err = broker.exchange_code("bad").await.unwrap_err();

    assert_eq!(err.kind(), "token_exchange_failed");
    assert_eq!(broker.current_record().unwrap().access_token, "at-old");
}

#[tokio::test]
async fn test_exchange_without_refresh_token_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "expires_in": 1800
        })))
        .mount(&server)
        .await;

    let broker = broker_with(&server, None);
    let err = broker.exchange_code("abc").await.unwrap_err();

    assert!(matches!(err, GatewayError::TokenExchangeFailed { .. }));
    assert_eq!(broker.state(), TokenState::Unauthenticated);
}

#[tokio::test]
async fn test_reauthorization_during_refresh_wins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(refresh_grant("at-refreshed", "rt-refreshed").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let store = TokenStore::new();
    store.set(record("at-old", "rt-old", -10));
    let broker = TokenBroker::with_store(store.clone(), endpoint_for(&server));

    let refresh = broker.get_valid_token();
    let reauthorize = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set(record("at-reauth", "rt-reauth", 600));
    };
    let (token, ()) = tokio::join!(refresh, reauthorize);

    assert_eq!(token.unwrap(), "at-reauth");
    assert_eq!(store.get().unwrap().refresh_token, "rt-reauth");
}

#[tokio::test]
async fn test_out_of_range_expires_in_fails_refresh_without_wedging() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-new",
            "refresh_token": "rt-new",
            "expires_in": 9_000_000_000_000i64
        })))
        .expect(3)
        .mount(&server)
        .await;

    let broker = broker_with(&server, Some(record("at-old", "rt-old", -10)));

    for _ in 0..2 {
        let err = broker.get_valid_token().await.unwrap_err();
        assert_eq!(err.kind(), "token_refresh_failed");
        assert!(err.to_string().contains("expires_in"));
    }
    let err = broker.force_refresh().await.unwrap_err();
    assert_eq!(err.kind(), "token_refresh_failed");

    assert_eq!(broker.current_record().unwrap().access_token, "at-old");
}

#[tokio::test]
async fn test_out_of_range_expires_in_fails_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": i64::MAX
        })))
        .mount(&server)
        .await;

    let broker = broker_with(&server, None);
    let err = broker.exchange_code("abc").await.unwrap_err();

    assert_eq!(err.kind(), "token_exchange_failed");
    assert_eq!(broker.state(), TokenState::Unauthenticated);
}

#[tokio::test]
async fn test_refresh_completes_after_caller_is_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(refresh_grant("at-new", "rt-new").set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = ClientCredentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost:3000/integrations/hubspot/oauth2callback".to_string(),
    };
    let endpoint =
        TokenEndpointClient::new(&server.uri(), credentials, Duration::from_millis(300)).unwrap();
    let store = TokenStore::new();
    store.set(record("at-old", "rt-old", -10));
    let broker = TokenBroker::with_store(store.clone(), endpoint);

    // Caller gives up before the grant returns
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), broker.get_valid_token()).await;
    assert!(abandoned.is_err());

    // Past both the grant delay and the endpoint timeout
    tokio::time::sleep(Duration::from_millis(600)).await;

    let installed = store.get().unwrap();
    assert_eq!(installed.access_token, "at-new");
    assert_eq!(installed.refresh_token, "rt-new");
    assert_eq!(broker.get_valid_token().await.unwrap(), "at-new");
}
