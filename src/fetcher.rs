use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{AdviceResult, EMPTY_RESPONSE_PLACEHOLDER, GenerateRequest};
use crate::transport::Transport;

#[cfg(test)]
use mockall::automock;

/// Turns a built prompt into a normalized [`AdviceResult`]
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdviceFetcher: Send + Sync {
    async fn fetch(&self, persona_name: &str, prompt: &str) -> Result<AdviceResult>;
}

pub struct GeminiAdvisor {
    tx: Arc<dyn Transport>,
    model: String,
    temperature: f32,
    enable_search: bool,
}

impl GeminiAdvisor {
    pub fn new(
        tx: Arc<dyn Transport>,
        model: String,
        temperature: f32,
        enable_search: bool,
    ) -> Self {
        Self {
            tx,
            model,
            temperature,
            enable_search,
        }
    }
}

#[async_trait]
impl AdviceFetcher for GeminiAdvisor {
    async fn fetch(&self, persona_name: &str, prompt: &str) -> Result<AdviceResult> {
        tracing::info!("Requesting roadmap from {} as {}", self.model, persona_name);

        let request = GenerateRequest::single_turn(prompt, self.temperature, self.enable_search);
        let response = self.tx.generate(&self.model, &request).await?;

        let content = response.text().unwrap_or_else(|| {
            tracing::warn!("Gemini returned no text for {}", persona_name);
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        });
        // Keep every chunk; non-web shapes are filtered when displayed
        let sources = response.into_grounding_chunks();
        tracing::debug!("Roadmap for {} has {} grounding chunks", persona_name, sources.len());

        Ok(AdviceResult {
            persona_name: persona_name.to_string(),
            content,
            sources,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchitectError;
    use crate::models::GenerateResponse;
    use serde_json::json;
    use std::sync::Mutex;

    // Mock Transport for testing
    struct MockTransport {
        responses: Mutex<Vec<Result<GenerateResponse>>>,
        requests: Mutex<Vec<(String, GenerateRequest)>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Result<GenerateResponse>>) -> Self {
            MockTransport {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn generate(&self, model: &str, req: &GenerateRequest) -> Result<GenerateResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((model.to_string(), req.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| {
                    Err(ArchitectError::Decode("No more mock responses".to_string()))
                })
        }
    }

    fn response(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_normalizes_text_and_sources() {
        let tx = Arc::new(MockTransport::new(vec![Ok(response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "## Year 1" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "somethingElse": true }
                    ]
                }
            }]
        })))]));
        let advisor = GeminiAdvisor::new(tx.clone(), "gemini-test".to_string(), 0.7, true);

        let result = advisor.fetch("Sal Khan", "the prompt").await.unwrap();
        assert_eq!(result.persona_name, "Sal Khan");
        assert_eq!(result.content, "## Year 1");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.web_sources().count(), 1);

        let requests = tx.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "gemini-test");
        assert_eq!(requests[0].1.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_empty_text_uses_placeholder() {
        let tx = Arc::new(MockTransport::new(vec![Ok(response(json!({
            "candidates": [{ "content": { "parts": [] } }]
        })))]));
        let advisor = GeminiAdvisor::new(tx, "m".to_string(), 0.7, true);

        let result = advisor.fetch("Fei-Fei Li", "p").await.unwrap();
        assert_eq!(result.content, EMPTY_RESPONSE_PLACEHOLDER);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_propagates_transport_error() {
        let tx = Arc::new(MockTransport::new(vec![Err(ArchitectError::Api {
            status: 429,
            message: "quota".to_string(),
        })]));
        let advisor = GeminiAdvisor::new(tx.clone(), "m".to_string(), 0.7, true);

        let err = advisor.fetch("Geoffrey Hinton", "p").await.unwrap_err();
        assert!(err.is_api());
        // exactly one attempt
        assert_eq!(tx.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_without_search_sends_no_tools() {
        let tx = Arc::new(MockTransport::new(vec![Ok(GenerateResponse::default())]));
        let advisor = GeminiAdvisor::new(tx.clone(), "m".to_string(), 0.2, false);

        advisor.fetch("x", "p").await.unwrap();
        let requests = tx.requests.lock().unwrap();
        assert!(requests[0].1.tools.is_empty());
        assert!((requests[0].1.generation_config.temperature - 0.2).abs() < 1e-6);
    }
}
