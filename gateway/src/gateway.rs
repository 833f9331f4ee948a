//! Provider selection and response-format coercion.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::provider::{anthropic::AnthropicClient, openai::OpenAiClient, Provider, ProviderId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

const STRUCTURED_SUFFIX: &str =
    "\n\nIMPORTANT: Respond ONLY with valid JSON, no additional text.";

/// How the caller wants the reply coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Parse the reply as JSON, salvaging a brace-delimited substring
    /// if the provider wrapped it in prose.
    Structured,
    /// Return the reply text as-is.
    Text,
}

/// A coerced provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Structured(Value),
    Text(String),
}

impl Reply {
    /// The structured payload, or [`GatewayError::MalformedResponse`]
    /// for a text reply.
    pub fn into_value(self) -> GatewayResult<Value> {
        match self {
            Reply::Structured(value) => Ok(value),
            Reply::Text(text) => Err(GatewayError::MalformedResponse(format!(
                "expected structured reply, got text: {}",
                truncate(&text)
            ))),
        }
    }

    /// The reply rendered as text. Structured replies are serialized.
    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::Structured(value) => value.to_string(),
        }
    }
}

/// Routes prompts to a configured provider and coerces replies.
///
/// Holds one client per backend with a usable credential. There is no
/// fallback between backends: a request for an unavailable provider
/// fails with [`GatewayError::ProviderUnavailable`].
pub struct Gateway {
    config: GatewayConfig,
    providers: Vec<Box<dyn Provider>>,
}

impl Gateway {
    /// Build a gateway from configuration, constructing a client for
    /// each backend with a resolvable credential.
    pub fn new(config: GatewayConfig) -> Self {
        let mut providers: Vec<Box<dyn Provider>> = Vec::new();
        if let Some(key) = config.credential(ProviderId::Claude) {
            providers.push(Box::new(AnthropicClient::new(key)));
        }
        if let Some(key) = config.credential(ProviderId::OpenAi) {
            providers.push(Box::new(OpenAiClient::new(key)));
        }
        if providers.iter().all(|p| !p.is_ready()) {
            warn!("no AI provider is ready; AI operations will fail until a key is configured");
        }
        Self { config, providers }
    }

    /// Replace (or install) the provider with the same id. Used to
    /// inject scripted backends in tests.
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.providers.retain(|p| p.id() != provider.id());
        self.providers.push(provider);
        self
    }

    /// The configuration this gateway was built from.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn resolve(&self, provider: Option<ProviderId>) -> GatewayResult<&dyn Provider> {
        let id = provider.unwrap_or(self.config.default_provider);
        self.providers
            .iter()
            .find(|p| p.id() == id && p.is_ready())
            .map(|p| p.as_ref())
            .ok_or(GatewayError::ProviderUnavailable(id))
    }

    /// Send a prompt and coerce the reply into the requested format.
    pub async fn query(
        &self,
        prompt: &str,
        format: ResponseFormat,
        provider: Option<ProviderId>,
    ) -> GatewayResult<Reply> {
        let backend = self.resolve(provider)?;
        let structured = format == ResponseFormat::Structured;
        let params = self.config.params_for(backend.id(), structured);

        let prompt = match format {
            ResponseFormat::Structured => format!("{prompt}{STRUCTURED_SUFFIX}"),
            ResponseFormat::Text => prompt.to_string(),
        };

        debug!(provider = %backend.id(), structured, "dispatching prompt");
        let raw = backend.complete(&prompt, &params).await?;

        match format {
            ResponseFormat::Structured => Ok(Reply::Structured(parse_structured(&raw)?)),
            ResponseFormat::Text => Ok(Reply::Text(raw)),
        }
    }

    /// Structured query returning the raw JSON value.
    pub(crate) async fn query_structured(
        &self,
        prompt: &str,
        provider: Option<ProviderId>,
    ) -> GatewayResult<Value> {
        self.query(prompt, ResponseFormat::Structured, provider)
            .await?
            .into_value()
    }

    /// Structured query deserialized into a typed reply.
    pub(crate) async fn query_typed<T: DeserializeOwned>(
        &self,
        prompt: &str,
        provider: Option<ProviderId>,
    ) -> GatewayResult<T> {
        let value = self.query_structured(prompt, provider).await?;
        serde_json::from_value(value.clone()).map_err(|e| {
            GatewayError::MalformedResponse(format!(
                "reply shape mismatch: {e} in {}",
                truncate(&value.to_string())
            ))
        })
    }
}

/// Parse a reply as JSON, falling back to the substring between the
/// first `{` and the last `}`.
fn parse_structured(raw: &str) -> GatewayResult<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }
    if let Some(candidate) = braced_substring(raw) {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }
    Err(GatewayError::MalformedResponse(truncate(raw)))
}

fn braced_substring(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.len() <= LIMIT {
        text.to_string()
    } else {
        let mut end = LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::GenerationParams;
    use async_trait::async_trait;

    struct OfflineProvider(ProviderId);

    #[async_trait]
    impl Provider for OfflineProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, GatewayError> {
            Err(GatewayError::Transport("offline".to_string()))
        }

        fn id(&self) -> ProviderId {
            self.0
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    fn bare_config() -> GatewayConfig {
        GatewayConfig {
            primary_model: "claude-test".to_string(),
            secondary_model: "gpt-test".to_string(),
            default_provider: ProviderId::Claude,
            temperature: 0.0,
            max_output_tokens: 256,
            claude_api_key: None,
            openai_api_key: None,
        }
    }

    #[tokio::test]
    async fn test_unready_provider_is_unavailable() {
        let gateway = Gateway::new(bare_config())
            .with_provider(Box::new(OfflineProvider(ProviderId::Claude)));
        let err = gateway
            .query("hello", ResponseFormat::Text, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::ProviderUnavailable(ProviderId::Claude)
        ));
    }

    #[tokio::test]
    async fn test_no_fallback_to_other_backend() {
        // Both slots hold unready backends; an explicit request for one
        // never falls back to the other.
        let gateway = Gateway::new(bare_config())
            .with_provider(Box::new(OfflineProvider(ProviderId::Claude)))
            .with_provider(Box::new(OfflineProvider(ProviderId::OpenAi)));
        let err = gateway
            .query("hello", ResponseFormat::Text, Some(ProviderId::OpenAi))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::ProviderUnavailable(ProviderId::OpenAi)
        ));
    }

    #[test]
    fn test_parse_structured_plain_json() {
        let value = parse_structured(r#"{"ok": true}"#).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_parse_structured_salvages_wrapped_json() {
        let raw = "Here is the plan:\n{\"actions\": []}\nLet me know.";
        let value = parse_structured(raw).unwrap();
        assert!(value["actions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_structured_rejects_prose() {
        let err = parse_structured("I cannot answer that.").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn test_reply_into_value_rejects_text() {
        let reply = Reply::Text("plain".to_string());
        assert!(reply.into_value().is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(300);
        let short = truncate(&long);
        assert!(short.ends_with("..."));
        assert!(short.len() <= 204);
    }
}
