// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured answers,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tajer_core::TajerError;
use tajer_core::traits::adapter::PluginAdapter;
use tajer_core::traits::provider::ProviderAdapter;
use tajer_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};

/// A mock provider that returns scripted answers in FIFO order.
///
/// `Ok` entries become the response text, `Err` entries fail the call with
/// a provider error. An empty queue fails every call, so an unexpected AI
/// round trip shows up as the "not understood" path rather than a panic.
pub struct MockProvider {
    answers: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty answer queue.
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with successful answers.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful answer.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.answers.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failing call.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.answers.lock().await.push_back(Err(message.into()));
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TajerError> {
        let model = request.model.clone().unwrap_or_else(|| "mock-model".to_string());
        self.requests.lock().await.push(request);

        match self.answers.lock().await.pop_front() {
            Some(Ok(content)) => Ok(ProviderResponse {
                id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
                content,
                model,
                stop_reason: Some("end_turn".to_string()),
            }),
            Some(Err(message)) => Err(TajerError::Provider {
                message,
                source: None,
            }),
            None => Err(TajerError::Provider {
                message: "no scripted response left".to_string(),
                source: None,
            }),
        }
    }
}
