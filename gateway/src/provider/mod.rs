//! Provider implementations.
//!
//! Each backend implements the [`Provider`] trait: a single-turn prompt
//! in, raw reply text out. The gateway layers format coercion on top.

pub mod anthropic;
pub mod openai;

use crate::error::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a generative-AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Claude => write!(f, "claude"),
            ProviderId::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ProviderId::Claude),
            "openai" => Ok(ProviderId::OpenAi),
            other => Err(GatewayError::Config(format!("unknown provider: {other}"))),
        }
    }
}

/// Generation settings passed to every provider call.
///
/// These are opaque tuning knobs drawn from [`crate::GatewayConfig`],
/// not part of the functional contract.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum output size in tokens.
    pub max_output_tokens: usize,
    /// Providers with a native JSON output mode honor this.
    pub structured: bool,
}

/// Core trait for provider backends.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send a single-turn prompt and return the raw reply text.
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError>;

    /// Which backend this is.
    fn id(&self) -> ProviderId;

    /// Whether the provider holds a usable credential.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_round_trip() {
        for id in [ProviderId::Claude, ProviderId::OpenAi] {
            let parsed: ProviderId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_provider_id_unknown() {
        assert!("gemini".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde() {
        let json = serde_json::to_string(&ProviderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }
}
