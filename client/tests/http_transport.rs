//! End-to-end tests against a local mock HTTP server.

use std::sync::Arc;

use serde_json::json;
use tubegenie_client::{
    ApiClient, BearerToken, Config, Error, HttpTransport, MutationCallbacks, StaticTokenSource,
    Transport, TransportError,
};
use tubegenie_client::transport::ApiRequest;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item(id: &str, favorite: bool) -> serde_json::Value {
    json!({
        "_id": id,
        "userId": "user_2abc",
        "topic": "sourdough basics",
        "titles": ["Sourdough for beginners"],
        "description": "Everything about starters",
        "tags": ["baking"],
        "thumbnailIdeas": ["A loaf on a board"],
        "scriptOutline": ["Intro", "Starter", "Bake"],
        "isFavorite": favorite,
        "aiModel": "gemini",
        "createdAt": "2025-01-15T10:30:00.000Z",
        "updatedAt": "2025-01-15T10:30:00.000Z",
        "__v": 0
    })
}

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let transport = HttpTransport::new(&Config::new(server.uri())).unwrap();
    let tokens = match token {
        Some(token) => StaticTokenSource::new(token),
        None => StaticTokenSource::signed_out(),
    };
    ApiClient::new(Arc::new(transport), Arc::new(tokens))
}

#[tokio::test]
async fn test_token_sent_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/models"))
        .and(header("authorization", "Bearer tok_a"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "defaultModel": "gemini",
            "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/content/analytics"))
        .and(header("authorization", "Bearer tok_b"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&Config::new(server.uri())).unwrap();
    let ok = transport
        .get("/api/content/models", &BearerToken::new("tok_a"))
        .await
        .unwrap();
    assert_eq!(ok.status, 200);

    let err = transport
        .get("/api/content/analytics", &BearerToken::new("tok_b"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 500, .. }));

    // A later call on the same client carries only its own token.
    let err = transport
        .get("/api/content/models", &BearerToken::new("tok_c"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));

    let received = server.received_requests().await.unwrap();
    let sent: Vec<Vec<String>> = received
        .iter()
        .map(|request| {
            request
                .headers
                .get_all("authorization")
                .iter()
                .map(|value| value.to_str().unwrap().to_string())
                .collect()
        })
        .collect();
    assert_eq!(
        sent,
        vec![
            vec!["Bearer tok_a".to_string()],
            vec!["Bearer tok_b".to_string()],
            vec!["Bearer tok_c".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_history_limit_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/history"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [item("c1", false)],
            "count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("tok"));
    let history = client
        .content_history(Some(20))
        .fetch()
        .await
        .into_result()
        .unwrap()
        .unwrap();

    assert_eq!(history.data.len(), 1);
    assert_eq!(history.data[0].id, "c1");
    assert_eq!(history.extra.count, Some(1));
}

#[tokio::test]
async fn test_not_found_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/content/c404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "Content not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("tok"));
    let err = client
        .delete_content()
        .mutate("c404".to_string(), MutationCallbacks::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to delete content: Content not found");
    assert_eq!(err.status_code(), Some(404));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_toggle_favorite_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/content/c1/favorite"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Added to favorites",
            "data": item("c1", true)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("tok"));
    let toggled = client
        .toggle_favorite()
        .mutate("c1".to_string(), MutationCallbacks::new())
        .await
        .unwrap();

    assert!(toggled.data.is_favorite);
    assert_eq!(toggled.extra.message.as_deref(), Some("Added to favorites"));
}

#[tokio::test]
async fn test_signed_out_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.favorites().fetch().await.into_result().unwrap_err();
    assert!(matches!(*err, Error::AuthRequired));
}

#[tokio::test]
async fn test_malformed_success_body_is_rejected() {
    let server = MockServer::start().await;
    let mut broken = item("c1", false);
    broken.as_object_mut().unwrap().remove("userId");
    Mock::given(method("GET"))
        .and(path("/api/content/c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": broken})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some("tok"));
    let err = client.content_by_id("c1").fetch().await.into_result().unwrap_err();
    match err.as_ref() {
        Error::Validation(v) => assert!(v.has_path("data.userId")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on the discard port.
    let transport = HttpTransport::new(&Config::new("http://127.0.0.1:9")).unwrap();
    let err = transport
        .execute(ApiRequest::get("/api/content/models"), &BearerToken::new("t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
