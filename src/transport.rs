use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

use crate::error::{ArchitectError, Result};
use crate::models::{ApiErrorBody, GenerateRequest, GenerateResponse};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate(&self, model: &str, req: &GenerateRequest) -> Result<GenerateResponse>;
}

/// Gemini `generateContent` over HTTPS. One attempt per call, no retries.
pub struct GeminiTransport {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiTransport {
    pub fn new(api_key: String) -> Self {
        Self::with_base(GEMINI_API_BASE.to_string(), api_key)
    }

    pub fn with_base(api_base: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate(&self, model: &str, req: &GenerateRequest) -> Result<GenerateResponse> {
        let start_time = Instant::now();
        let url = self.endpoint(model);
        tracing::debug!("Sending generateContent request to {}", url);

        // The key is not checked up front; a missing key surfaces as a 4xx from the service
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::info!(
            model = %model,
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Gemini request finished"
        );

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(ArchitectError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| {
                ArchitectError::Decode(format!("Failed to parse Gemini API response: {e}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta/models")
    }

    async fn ok_handler(
        State(captured): State<Captured>,
        Path(model_call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.calls.lock().unwrap().push((model_call, key, body));
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "# Plan" }] },
                "groundingMetadata": {
                    "groundingChunks": [{ "web": { "uri": "https://ctf.example", "title": "CTF" } }]
                }
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_posts_request_with_key() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1beta/models/:model_call", post(ok_handler))
            .with_state(captured.clone());
        let base = spawn_stub(router).await;

        let transport = GeminiTransport::with_base(base, "test-key".to_string());
        let req = GenerateRequest::single_turn("roadmap please", 0.7, true);
        let resp = transport.generate("gemini-test", &req).await.unwrap();

        assert_eq!(resp.text().as_deref(), Some("# Plan"));
        assert_eq!(resp.into_grounding_chunks().len(), 1);

        let calls = captured.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (model_call, key, body) = &calls[0];
        assert_eq!(model_call, "gemini-test:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "roadmap please");
        assert_eq!(body["tools"][0], json!({ "googleSearch": {} }));
    }

    #[tokio::test]
    async fn test_generate_maps_api_error() {
        let router = Router::new().route(
            "/v1beta/models/:model_call",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": {
                            "code": 403,
                            "message": "API key not valid",
                            "status": "PERMISSION_DENIED"
                        }
                    })),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let transport = GeminiTransport::with_base(base, String::new());
        let req = GenerateRequest::single_turn("x", 0.7, true);
        let err = transport.generate("gemini-test", &req).await.unwrap_err();

        assert!(err.is_api());
        match err {
            ArchitectError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_undecodable_body() {
        let router = Router::new().route(
            "/v1beta/models/:model_call",
            post(|| async { "not json" }),
        );
        let base = spawn_stub(router).await;

        let transport = GeminiTransport::with_base(base, "k".to_string());
        let req = GenerateRequest::single_turn("x", 0.7, false);
        let err = transport.generate("m", &req).await.unwrap_err();
        assert!(matches!(err, ArchitectError::Decode(_)));
    }

    #[tokio::test]
    async fn test_generate_reports_connection_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = GeminiTransport::with_base(format!("http://{addr}"), "k".to_string());
        let req = GenerateRequest::single_turn("x", 0.7, false);
        let err = transport.generate("m", &req).await.unwrap_err();
        assert!(matches!(err, ArchitectError::Http(_)));
    }
}
