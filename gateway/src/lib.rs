//! Uniform request/response contract over generative-AI backends.
//!
//! This crate provides:
//! - A [`Provider`] trait with Anthropic and OpenAI implementations
//! - A [`Gateway`] that owns provider selection, prompt dispatch, and
//!   response-format coercion (structured data vs free text)
//! - Declarative prompt operations (template + expected reply shape)
//!   for the orchestration engine's higher-level AI calls
//!
//! # Quick Start
//!
//! ```ignore
//! use gateway::{Gateway, GatewayConfig, ResponseFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::load_or_create("./daemon_data/ai_config.json")?;
//!     let gateway = Gateway::new(config);
//!
//!     let reply = gateway
//!         .query("Summarize the network status.", ResponseFormat::Text, None)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod gateway;
pub mod ops;
pub mod provider;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, Reply, ResponseFormat};
pub use provider::{GenerationParams, Provider, ProviderId};
