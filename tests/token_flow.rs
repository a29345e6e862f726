/*
 *  tests/token_flow.rs
 *
 *  Token manager against a mocked accounts service
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 */

use serde_json::json;
use spotipi::auth::{AuthError, TokenManager, TokenPair};
use spotipi::credentials::{CredentialStore, Credentials};
use spotipi::error::{NetworkError, SpotiPiError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASIC: &str = "Basic Y2xpZW50OnNlY3JldA=="; // client:secret

#[tokio::test]
async fn test_exchange_code_sends_basic_auth_and_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Fcallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "RT1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenManager::new(&server.uri()).unwrap();
    let pair = tokens
        .exchange_code("client", "secret", "http://localhost:8888/callback", "abc123")
        .await
        .unwrap();

    assert_eq!(pair, TokenPair { access_token: "AT1".into(), refresh_token: Some("RT1".into()) });
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=RT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("spotify_config.json"));
    let mut creds = Credentials::new("client", "secret", "http://localhost:8888/callback");
    creds.apply(TokenPair { access_token: "AT1".into(), refresh_token: Some("RT1".into()) });
    store.persist(&creds).unwrap();

    let tokens = TokenManager::new(&server.uri()).unwrap();
    tokens.refresh_and_persist(&mut creds, &store).await.unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.access_token(), Some("AT2"));
    assert_eq!(reloaded.refresh_token(), Some("RT1"));
    assert_eq!(reloaded, creds);
}

#[tokio::test]
async fn test_refresh_with_rotation_stores_new_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "refresh_token": "RT2"
        })))
        .mount(&server)
        .await;

    let tokens = TokenManager::new(&server.uri()).unwrap();
    let pair = tokens.refresh_token("client", "secret", "RT1").await.unwrap();
    assert_eq!(pair.refresh_token.as_deref(), Some("RT2"));
}

#[tokio::test]
async fn test_missing_access_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
        .mount(&server)
        .await;

    let tokens = TokenManager::new(&server.uri()).unwrap();
    let err = tokens
        .exchange_code("client", "secret", "http://localhost/cb", "abc")
        .await
        .unwrap_err();
    assert!(matches!(err, SpotiPiError::Auth(AuthError::MissingAccessToken)));
}

#[tokio::test]
async fn test_rejected_grant_is_network_error_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&server)
        .await;

    let tokens = TokenManager::new(&server.uri()).unwrap();
    let err = tokens
        .exchange_code("client", "secret", "http://localhost/cb", "stale")
        .await
        .unwrap_err();
    match err {
        SpotiPiError::Network(NetworkError::Status { status, detail, .. }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(detail.as_deref(), Some("invalid_grant: Invalid authorization code"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tokens = TokenManager::new(&server.uri()).unwrap();
    let err = tokens.refresh_token("client", "secret", "RT1").await.unwrap_err();
    assert!(matches!(err, SpotiPiError::Network(NetworkError::Status { .. })));
}
