//! Integration tests for the portal HTTP clients

#![cfg(feature = "client")]

use devportal_core::{SessionError, TokenEndpoint, TokenGrant, TokenRequest};
use devportal_http::client::{ApiClient, ClientError, TokenClient};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refresh_request() -> TokenRequest {
    TokenRequest {
        client_id: "client-1".into(),
        redirect_uri: "https://portal.example.com/".into(),
        grant: TokenGrant::RefreshToken {
            refresh_token: "r1".into(),
        },
    }
}

#[tokio::test]
async fn test_token_client_builder_requires_domain() {
    let result = TokenClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));

    let result = TokenClient::new("not a url");
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_token_url_ignores_trailing_slash() {
    let client = TokenClient::new("https://auth.example.com/").unwrap();
    assert_eq!(client.token_url(), "https://auth.example.com/oauth2/token");
}

#[tokio::test]
async fn test_refresh_posts_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(
            "grant_type=refresh_token&client_id=client-1\
             &redirect_uri=https%3A%2F%2Fportal.example.com%2F&refresh_token=r1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "t2",
            "access_token": "a2",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TokenClient::new(mock_server.uri()).unwrap();
    let response = client.request_tokens(&refresh_request()).await.unwrap();

    assert_eq!(response.id_token.as_deref(), Some("t2"));
    assert_eq!(response.access_token.as_deref(), Some("a2"));
    assert_eq!(response.refresh_token, None);
    assert_eq!(response.expires_in, Some(3600));
}

#[tokio::test]
async fn test_code_exchange_sends_verifier() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string(
            "grant_type=authorization_code&client_id=client-1\
             &redirect_uri=https%3A%2F%2Fportal.example.com%2F&code=c1&code_verifier=v1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "t1",
            "refresh_token": "r1"
        })))
        .mount(&mock_server)
        .await;

    let client = TokenClient::new(mock_server.uri()).unwrap();
    let request = TokenRequest {
        grant: TokenGrant::AuthorizationCode {
            code: "c1".into(),
            code_verifier: "v1".into(),
        },
        ..refresh_request()
    };
    let response = client.request_tokens(&request).await.unwrap();

    assert_eq!(response.refresh_token.as_deref(), Some("r1"));
    assert_eq!(response.expires_in, None);
}

#[tokio::test]
async fn test_rejected_refresh_is_a_session_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&mock_server)
        .await;

    let client = TokenClient::new(mock_server.uri()).unwrap();

    let result = client.exchange(&refresh_request()).await;
    assert!(matches!(result, Err(ClientError::BadRequest(ref message)) if message.contains("invalid_grant")));

    let result = client.request_tokens(&refresh_request()).await;
    assert!(matches!(
        result,
        Err(SessionError::TokenEndpoint { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_undecodable_token_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = TokenClient::new(mock_server.uri()).unwrap();
    let result = client.request_tokens(&refresh_request()).await;
    assert!(matches!(result, Err(SessionError::Serialization(_))));
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    // Nothing listens on the discard port
    let client = TokenClient::new("http://127.0.0.1:9").unwrap();
    let result = client.request_tokens(&refresh_request()).await;
    assert!(matches!(result, Err(SessionError::Transport(_))));
}

#[tokio::test]
async fn test_api_client_sends_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(format!("{}/api/", mock_server.uri()), "t1").unwrap();
    assert_eq!(client.base_url(), format!("{}/api", mock_server.uri()));

    let body: serde_json::Value = client.get_json("/health").await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_client_flags_expired_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/logs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(format!("{}/api", mock_server.uri()), "stale").unwrap();
    let result = client.get_json::<serde_json::Value>("/logs").await;

    let err = result.unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_api_client_requires_token() {
    let result = ApiClient::new("https://portal.example.com/api", "");
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}
