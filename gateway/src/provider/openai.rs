//! OpenAI Chat Completions API client.

use super::{GenerationParams, Provider, ProviderId};
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are an autonomous AI system managing a distributed network.";

/// Client for OpenAI's Chat Completions API.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client with the given API key. An empty key yields a
    /// client that reports not ready.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| GatewayError::Config(format!("invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl Provider for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        let request = ApiRequest {
            model: &params.model,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ApiMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
            response_format: params.structured.then_some(ApiResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(API_URL)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, message });
        }

        let reply: ApiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Transport("provider returned no completion".to_string()))
    }

    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ApiResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_readiness() {
        let client = OpenAiClient::new("sk-test");
        assert_eq!(client.id(), ProviderId::OpenAi);
        assert!(client.is_ready());
        assert!(!OpenAiClient::new("").is_ready());
    }

    #[test]
    fn test_json_mode_serialization() {
        let request = ApiRequest {
            model: "gpt-4-turbo-preview",
            messages: vec![],
            temperature: 0.7,
            max_tokens: 256,
            response_format: Some(ApiResponseFormat {
                kind: "json_object",
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_choice_extraction() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#;
        let response: ApiResponse = serde_json::from_str(raw).unwrap();
        let content = response.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.as_deref(), Some("ok"));
    }
}
