//! Integration tests for the HTTP completion backends
//!
//! Runs the proxy and Groq clients against a local mock server

use kestrel::completion::{GroqBackend, ProxyBackend, backend_from_settings};
use kestrel::{CompletionBackend, CompletionError, Settings};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod proxy_tests {
    use super::*;

    #[tokio::test]
    async fn test_proxy_sends_message_and_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/server"))
            .and(body_json(json!({ "message": "hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "hello" })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = ProxyBackend::new(format!("{}/api/server", server.uri()));
        let reply = backend.complete("hi").await.expect("reply");
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_proxy_server_error_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal error" })),
            )
            .mount(&server)
            .await;

        let backend = ProxyBackend::new(server.uri());
        let err = backend.complete("hi").await.unwrap_err();
        match err {
            CompletionError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("Internal error"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_proxy_garbage_body_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let backend = ProxyBackend::new(server.uri());
        let err = backend.complete("hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::Decode(_)));
    }
}

mod groq_tests {
    use super::*;

    #[tokio::test]
    async fn test_groq_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "hello from groq" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = GroqBackend::new(
            format!("{}/openai/v1/chat/completions", server.uri()),
            "llama-3.3-70b-versatile".to_string(),
            "test-key".to_string(),
        );
        let reply = backend.complete("hi").await.expect("reply");
        assert_eq!(reply, "hello from groq");
    }

    #[tokio::test]
    async fn test_groq_without_choices_is_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let backend = GroqBackend::new(server.uri(), "m".to_string(), "k".to_string());
        let reply = backend.complete("hi").await.expect("reply");
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_groq_rate_limit_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let backend = GroqBackend::new(server.uri(), "m".to_string(), "k".to_string());
        let err = backend.complete("hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::Status { .. }));
    }
}

mod selection_tests {
    use super::*;

    #[tokio::test]
    async fn test_proxy_takes_priority_over_groq() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proxy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "via proxy" })))
            .mount(&server)
            .await;

        let settings = Settings {
            proxy_endpoint: Some(format!("{}/proxy", server.uri())),
            groq_api_key: Some("unused".to_string()),
            ..Settings::default()
        };
        let backend = backend_from_settings(&settings);
        assert_eq!(backend.complete("hi").await.expect("reply"), "via proxy");
    }

    #[tokio::test]
    async fn test_no_backend_configured() {
        let backend = backend_from_settings(&Settings::default());
        let err = backend.complete("hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::NotConfigured));
    }
}
