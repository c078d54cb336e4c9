//! HTTP transport tests against a mock upstream

use std::sync::Arc;
use std::time::Duration;

use ppx_bridge::PerplexityClient;
use ppx_bridge::error::ErrorCode;
use ppx_bridge::request::RequestBuilder;
use ppx_bridge::settings::SessionCookies;
use ppx_bridge::transport::{ASK_PATH, HttpTransport, Transport, TransportError};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT_STREAM: &str = concat!(
    ": ping\n",
    "data: {\"backend_uuid\": \"conv-42\", \"status\": \"PENDING\"}\n",
    "\n",
    "data: {\"blocks\": [{\"diff_block\": {\"field\": \"markdown_block\", \"patches\": [{\"path\": \"\", \"value\": {\"chunks\": [\"Hel\"]}}]}}]}\n",
    "data: {\"blocks\": [{\"diff_block\": {\"field\": \"markdown_block\", \"patches\": [{\"path\": \"/chunks/1\", \"value\": \"lo\"}]}}]}\n",
    "data: {\"blocks\": [{\"diff_bl\n"
);

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(server.uri(), Duration::from_secs(5)).expect("transport")
}

#[tokio::test]
async fn test_client_decodes_event_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .and(header("cookie", "session=abc"))
        .and(header("accept", "text/event-stream"))
        .and(header_exists("x-request-id"))
        .and(body_partial_json(serde_json::json!({
            "query_str": "What is 2 + 2?",
            "params": {"model_preference": "turbo", "version": "2.18"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(EVENT_STREAM),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PerplexityClient::new(
        Arc::new(transport(&server)),
        SessionCookies::new("session=abc"),
        RequestBuilder::default(),
    );
    let decoded = client.ask("What is 2 + 2?", "turbo").await.unwrap();

    assert_eq!(decoded.answer.as_deref(), Some("Hello"));
    assert_eq!(decoded.conversation_id.as_deref(), Some("conv-42"));
}

#[tokio::test]
async fn test_forbidden_maps_to_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("cf challenge"))
        .mount(&server)
        .await;

    let payload = RequestBuilder::default().build("q", "turbo");
    let err = transport(&server)
        .post_ask(&payload, &SessionCookies::new("s=1"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::SessionExpired));
}

#[tokio::test]
async fn test_rate_limit_maps_to_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = PerplexityClient::new(
        Arc::new(transport(&server)),
        SessionCookies::new("s=1"),
        RequestBuilder::default(),
    );
    let err = client.ask("q", "turbo").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RateLimitExceeded);
    assert_eq!(err.message, "Rate limit exceeded (429). Please wait.");
}

#[tokio::test]
async fn test_other_status_keeps_body_preview() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1000)))
        .mount(&server)
        .await;

    let payload = RequestBuilder::default().build("q", "turbo");
    let err = transport(&server)
        .post_ask(&payload, &SessionCookies::new("s=1"))
        .await
        .unwrap_err();
    match err {
        TransportError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.len(), 200);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_success_status_is_still_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let payload = RequestBuilder::default().build("q", "turbo");
    let err = transport(&server)
        .post_ask(&payload, &SessionCookies::new("s=1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 204: ");
}

#[tokio::test]
async fn test_unreachable_upstream_is_network_error() {
    let transport = HttpTransport::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let payload = RequestBuilder::default().build("q", "turbo");
    let err = transport
        .post_ask(&payload, &SessionCookies::new("s=1"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
