//! Gateway configuration.
//!
//! Tuning knobs and credentials for the provider backends. The file on
//! disk is JSON; environment variables override individual fields at
//! load time, and API keys are resolved environment-first so they never
//! need to touch disk.

use crate::error::{GatewayError, GatewayResult};
use crate::provider::{GenerationParams, ProviderId};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: usize = 4096;

/// Configuration for the provider gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Model used for Claude requests.
    pub primary_model: String,
    /// Model used for OpenAI requests.
    pub secondary_model: String,
    /// Provider used when a call does not name one.
    pub default_provider: ProviderId,
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum output size in tokens.
    pub max_output_tokens: usize,
    /// Anthropic API key. Environment takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_api_key: Option<String>,
    /// OpenAI API key. Environment takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            primary_model: env_or("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
            secondary_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            default_provider: std::env::var("DEFAULT_AI")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ProviderId::Claude),
            temperature: env_parsed("AI_TEMPERATURE", DEFAULT_TEMPERATURE),
            max_output_tokens: env_parsed("AI_MAX_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS),
            claude_api_key: None,
            openai_api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `path`, creating the file with defaults
    /// if it does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(e) => Err(GatewayError::Io(e)),
        }
    }

    /// Write configuration to `path` as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> GatewayResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resolve the API key for a provider, environment first, config
    /// file second.
    pub fn credential(&self, provider: ProviderId) -> Option<String> {
        let (env_var, stored) = match provider {
            ProviderId::Claude => ("ANTHROPIC_API_KEY", &self.claude_api_key),
            ProviderId::OpenAi => ("OPENAI_API_KEY", &self.openai_api_key),
        };
        std::env::var(env_var)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| stored.clone())
    }

    /// Generation parameters for a provider call.
    pub fn params_for(&self, provider: ProviderId, structured: bool) -> GenerationParams {
        let model = match provider {
            ProviderId::Claude => self.primary_model.clone(),
            ProviderId::OpenAi => self.secondary_model.clone(),
        };
        GenerationParams {
            model,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            structured,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_config() -> GatewayConfig {
        GatewayConfig {
            primary_model: "claude-test".to_string(),
            secondary_model: "gpt-test".to_string(),
            default_provider: ProviderId::Claude,
            temperature: 0.5,
            max_output_tokens: 1024,
            claude_api_key: None,
            openai_api_key: None,
        }
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_config.json");

        let created = GatewayConfig::load_or_create(&path).unwrap();
        assert!(path.exists());

        let reloaded = GatewayConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded.primary_model, created.primary_model);
        assert_eq!(reloaded.default_provider, created.default_provider);
    }

    #[test]
    fn test_save_omits_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_config.json");

        fixed_config().save(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("claude_api_key"));
        assert!(!raw.contains("openai_api_key"));
    }

    #[test]
    fn test_params_for_selects_model() {
        let config = fixed_config();
        let claude = config.params_for(ProviderId::Claude, true);
        assert_eq!(claude.model, "claude-test");
        assert!(claude.structured);

        let openai = config.params_for(ProviderId::OpenAi, false);
        assert_eq!(openai.model, "gpt-test");
        assert!(!openai.structured);
    }

    #[test]
    fn test_stored_credential_used_when_env_absent() {
        let config = GatewayConfig {
            claude_api_key: Some("from-file".to_string()),
            ..fixed_config()
        };
        // ANTHROPIC_API_KEY may be set in the environment; only assert
        // the fallback when it is not.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert_eq!(
                config.credential(ProviderId::Claude).as_deref(),
                Some("from-file")
            );
        }
    }
}
