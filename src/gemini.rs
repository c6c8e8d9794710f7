//! Gemini API client
//!
//! Provides direct LLM integration for text generation.
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{Config, GEMINI_MODEL};
use crate::error::GatewayError;

/// Anything that turns a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> crate::Result<String>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> crate::Result<Self> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::Config(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        info!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini API");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the API key
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                GatewayError::LlmError(format!("Gemini API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(GatewayError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            GatewayError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                "Gemini token usage"
            );
        }

        let text = extract_text(&gemini_response)?;

        info!(
            finish_reason = gemini_response.candidates[0].finish_reason.as_deref().unwrap_or("UNKNOWN"),
            response_chars = text.len(),
            "Gemini response received"
        );

        Ok(text)
    }
}

/// Concatenate every text part of the first candidate
fn extract_text(response: &GeminiResponse) -> crate::Result<String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GatewayError::LlmError("No response from Gemini API".to_string()))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GatewayError::LlmError(format!(
            "Empty response from Gemini (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("UNKNOWN")
        )));
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;

    /// Serve `router` on an ephemeral local port and return its base URL
    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    fn client_for(base_url: String) -> GeminiClient {
        GeminiClient::new("test-key".into(), base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("What is RSI?".to_string()),
                }],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is RSI?");
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 2 }
        }))
        .unwrap();

        assert_eq!(extract_text(&response).unwrap(), "Hello there");
    }

    #[test]
    fn test_extract_text_rejects_empty() {
        let response: GeminiResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(extract_text(&response).is_err());

        let blocked: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        let err = extract_text(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let result = GeminiClient::new(
            " ".into(),
            "http://localhost".into(),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_generate_against_stub() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(
                |Path(call): Path<String>,
                 Query(params): Query<HashMap<String, String>>,
                 Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(call, "gemini-1.5-flash:generateContent");
                    assert_eq!(params.get("key").map(String::as_str), Some("test-key"));
                    let prompt = body["contents"][0]["parts"][0]["text"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    Json(serde_json::json!({
                        "candidates": [{
                            "content": { "parts": [{ "text": format!("echo: {}", prompt) }] },
                            "finishReason": "STOP"
                        }]
                    }))
                },
            ),
        );

        let client = client_for(spawn_stub(router).await);
        let text = client.generate("What is SIP?").await.unwrap();
        assert_eq!(text, "echo: What is SIP?");
    }

    #[tokio::test]
    async fn test_generate_surfaces_upstream_status() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );

        let client = client_for(spawn_stub(router).await);
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, GatewayError::LlmError(_)));
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota exceeded"));
    }
}
