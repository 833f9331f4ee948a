//! Testing utilities for the orchestration engine.
//!
//! This module provides tools for integration testing:
//! - `MockProvider` for deterministic testing without API calls
//! - `TestHarness` for scripted orchestration scenarios

use crate::daemon::{Daemon, DaemonConfig, DaemonError, StopHandle};
use crate::network::NetworkState;
use async_trait::async_trait;
use gateway::{Gateway, GatewayConfig, GatewayError, GenerationParams, Provider, ProviderId};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A provider that returns scripted raw replies in order.
///
/// Use this for deterministic integration tests without API calls.
/// Each queued entry is either a raw reply string or a transport
/// failure message.
pub struct MockProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue a raw reply.
    pub fn queue(&self, reply: impl Into<String>) {
        self.lock().push_back(Ok(reply.into()));
    }

    /// Queue a transport failure.
    pub fn queue_failure(&self, message: impl Into<String>) {
        self.lock().push_back(Err(message.into()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        match self.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(GatewayError::Transport(message)),
            None => Err(GatewayError::Transport(
                "mock provider has no more scripted replies".to_string(),
            )),
        }
    }

    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Newtype so the shared mock can be handed to the gateway as a
/// `Box<dyn Provider>` (the orphan rule forbids implementing the
/// foreign `Provider` trait directly for `Arc<MockProvider>`).
struct SharedMockProvider(Arc<MockProvider>);

#[async_trait]
impl Provider for SharedMockProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        self.0.complete(prompt, params).await
    }

    fn id(&self) -> ProviderId {
        self.0.id()
    }

    fn is_ready(&self) -> bool {
        self.0.is_ready()
    }
}

/// A daemon wired to a mock gateway over a caller-owned temp directory.
pub struct TestHarness {
    pub daemon: Daemon,
    pub stop: StopHandle,
    pub provider: Arc<MockProvider>,
}

impl TestHarness {
    /// Build a harness rooted at `data_dir`. The gateway config is
    /// fixed rather than environment-derived so tests are hermetic.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, DaemonError> {
        let config = GatewayConfig {
            primary_model: "mock-model".to_string(),
            secondary_model: "mock-model".to_string(),
            default_provider: ProviderId::Claude,
            temperature: 0.0,
            max_output_tokens: 512,
            claude_api_key: None,
            openai_api_key: None,
        };
        let provider = MockProvider::new();
        let gateway = Gateway::new(config).with_provider(Box::new(SharedMockProvider(provider.clone())));

        let daemon_config = DaemonConfig::new(data_dir.as_ref())
            .with_poll_interval(Duration::from_millis(10));
        let (daemon, stop) = Daemon::with_gateway(daemon_config, gateway).await?;

        Ok(Self {
            daemon,
            stop,
            provider,
        })
    }

    /// Queue the next scripted reply.
    pub fn expect_reply(&self, raw: impl Into<String>) {
        self.provider.queue(raw);
    }

    /// Queue a scripted transport failure.
    pub fn expect_failure(&self, message: impl Into<String>) {
        self.provider.queue_failure(message);
    }

    pub fn state(&self) -> &NetworkState {
        self.daemon.state()
    }
}
