//! End-to-end tests of the auth pipeline against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use reissue_client::{
    ApiClient, ApiRequest, Error, FileTokenStore, LoginRequest, MemoryTokenStore, OAuthProfile,
    RefreshError, SharedTokenStore, SignupRequest, TokenStore,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, store: SharedTokenStore) -> ApiClient {
    ApiClient::builder()
        .base_url(server.uri())
        .token_store(store)
        .build()
        .unwrap()
}

fn tokens(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
    }))
}

async fn authorization_headers(server: &MockServer) -> Vec<(String, Option<String>)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| {
            let auth = r
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            (r.url.path().to_string(), auth)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Header attachment
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_with_empty_store_has_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"auth_id": "kim", "password": "pw"})))
        .respond_with(tokens("A1", "R1"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client(&server, store.clone());

    let session = client
        .auth()
        .login(&LoginRequest::new("kim", "pw"))
        .await
        .unwrap();
    assert_eq!(session.access_token.as_deref(), Some("A1"));

    assert_eq!(
        authorization_headers(&server).await,
        vec![("/users/login".to_string(), None)]
    );
    let stored = store.load_session().await.unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_bootstrap_endpoints_ignore_stored_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(tokens("A2", "R2"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(tokens("A3", "R3"))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));

    client
        .auth()
        .login(&LoginRequest::new("kim", "pw"))
        .await
        .unwrap();
    client
        .auth()
        .signup(&SignupRequest {
            auth_id: "lee".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let headers = authorization_headers(&server).await;
    assert_eq!(headers.len(), 2);
    assert!(headers.iter().all(|(_, auth)| auth.is_none()));
}

#[tokio::test]
async fn test_unauthorized_login_is_not_reissued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad credentials"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2"))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_session("A1", "R1"));
    let client = client(&server, store.clone());

    let err = client
        .auth()
        .login(&LoginRequest::new("kim", "wrong"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());

    assert_eq!(
        authorization_headers(&server).await,
        vec![("/users/login".to_string(), None)]
    );
    let stored = store.load_session().await.unwrap();
    assert_eq!(stored.access_token.as_deref(), Some("A1"));
    assert_eq!(stored.refresh_token.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_anonymous_request_is_not_reissued() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2"))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_session("A1", "R1"));
    let client = client(&server, store.clone());

    let response = client
        .send(ApiRequest::get("/public").without_credentials())
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 401);

    assert_eq!(
        authorization_headers(&server).await,
        vec![("/public".to_string(), None)]
    );
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_resource_request_carries_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "kim"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));
    let profile: serde_json::Value = client.get("/profile").await.unwrap();
    assert_eq!(profile["name"], "kim");
}

#[tokio::test]
async fn test_resource_request_without_token_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::new()));
    let _: serde_json::Value = client.get("/notices").await.unwrap();

    assert_eq!(
        authorization_headers(&server).await,
        vec![("/notices".to_string(), None)]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh and retry
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_access_token_is_reissued_and_request_replayed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .and(header("authorization", "Bearer R1"))
        .respond_with(tokens("A2", "R2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_session("A1", "R1"));
    let client = client(&server, store.clone());

    let orders: serde_json::Value = client.get("/orders").await.unwrap();
    assert_eq!(orders, json!([{"id": 1}]));

    let session = store.load_session().await.unwrap();
    assert_eq!(session.access_token.as_deref(), Some("A2"));
    assert_eq!(session.refresh_token.as_deref(), Some("R2"));
    assert_eq!(store.write_count(), 1);

    assert_eq!(
        authorization_headers(&server).await,
        vec![
            ("/orders".to_string(), Some("Bearer A1".to_string())),
            ("/users/reissue".to_string(), Some("Bearer R1".to_string())),
            ("/orders".to_string(), Some("Bearer A2".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_second_unauthorized_propagates_without_another_reissue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));

    let err = client.get::<serde_json::Value>("/orders").await.unwrap_err();
    assert!(matches!(err, Error::Auth(ref m) if m == "expired"));
    assert!(err.requires_login());
}

#[tokio::test]
async fn test_unauthorized_reissue_request_propagates_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));

    let response = client
        .send(ApiRequest::post("/users/reissue"))
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(
        authorization_headers(&server).await,
        vec![("/users/reissue".to_string(), Some("Bearer R1".to_string()))]
    );
}

#[tokio::test]
async fn test_reissue_network_failure_is_explicit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_session("A1", "R1"));
    let client = ApiClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .token_store(store.clone())
        .build()
        .unwrap();

    let err = client.get::<serde_json::Value>("/orders").await.unwrap_err();
    assert!(matches!(
        err,
        Error::SessionExpired(RefreshError::Transport(_))
    ));
    assert!(err.requires_login());

    // A network failure says nothing about the refresh token; keep it.
    let session = store.load_session().await.unwrap();
    assert_eq!(session.refresh_token.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_rejected_reissue_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_session("A1", "R1"));
    let client = client(&server, store.clone());

    let err = client.get::<serde_json::Value>("/orders").await.unwrap_err();
    assert!(matches!(
        err,
        Error::SessionExpired(RefreshError::Rejected { status: 403 })
    ));
    assert!(!client.session().await.unwrap().can_refresh());
}

#[tokio::test]
async fn test_malformed_reissue_body_is_explicit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));

    let err = client.get::<serde_json::Value>("/orders").await.unwrap_err();
    assert!(matches!(
        err,
        Error::SessionExpired(RefreshError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_concurrent_expiries_share_one_reissue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2").set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(5)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));

    let calls = (0..5).map(|_| client.get::<serde_json::Value>("/orders"));
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));
}

// ─────────────────────────────────────────────────────────────────────────────
// Error propagation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_timeout_is_not_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .respond_with(tokens("A2", "R2"))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .token_store(Arc::new(MemoryTokenStore::with_session("A1", "R1")))
        .build()
        .unwrap();

    let err = client.get::<serde_json::Value>("/slow").await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_login_errors_reach_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"auth_id": "", "password": ""})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "missing fields"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"auth_id": "kim", "password": "wrong"})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no match"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client(&server, store.clone());

    let err = client
        .auth()
        .login(&LoginRequest::new("", ""))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = client
        .auth()
        .login(&LoginRequest::new("kim", "wrong"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(store.write_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_oauth_login_forwards_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/oauth"))
        .and(body_json(json!({
            "id": "g-1",
            "email": "kim@example.com",
            "name": "Kim",
        })))
        .respond_with(tokens("A1", "R1"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::new()));
    let profile = OAuthProfile {
        id: "g-1".to_string(),
        email: "kim@example.com".to_string(),
        name: Some("Kim".to_string()),
        picture: None,
    };

    let session = client.auth().oauth_login(&profile).await.unwrap();
    assert!(session.is_authenticated());
    assert!(client.session().await.unwrap().is_authenticated());
}

#[tokio::test]
async fn test_logout_then_request_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));
    client.auth().logout().await.unwrap();
    assert!(!client.auth().session().await.unwrap().is_authenticated());

    let _: serde_json::Value = client.get("/profile").await.unwrap();
    assert_eq!(
        authorization_headers(&server).await,
        vec![("/profile".to_string(), None)]
    );
}

#[tokio::test]
async fn test_file_store_survives_client_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(tokens("A1", "R1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();

    let first = client(&server, Arc::new(FileTokenStore::new(temp.path())));
    first
        .auth()
        .login(&LoginRequest::new("kim", "pw"))
        .await
        .unwrap();
    drop(first);

    let second = client(&server, Arc::new(FileTokenStore::new(temp.path())));
    let _: serde_json::Value = second.get("/orders").await.unwrap();
}

#[tokio::test]
async fn test_manual_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/reissue"))
        .and(header("authorization", "Bearer R1"))
        .respond_with(tokens("A2", "R2"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_session("A1", "R1")));
    assert_eq!(client.refresh().await.unwrap(), "A2");

    let empty = ApiClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    let err = empty.refresh().await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired(RefreshError::MissingToken)));
}
