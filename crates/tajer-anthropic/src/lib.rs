// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude adapter backing the Tajer AI fallback.
//!
//! Implements [`ProviderAdapter`] over the Anthropic Messages API with
//! single-shot, non-streaming completions.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tajer_config::model::AnthropicConfig;
use tajer_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use tajer_core::{PluginAdapter, ProviderAdapter, TajerError};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    pub fn new(config: &AnthropicConfig) -> Result<Self, TajerError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            config.default_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.default_model, "Anthropic provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }

    fn to_message_request(&self, request: &ProviderRequest) -> MessageRequest {
        MessageRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.client.default_model().to_string()),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            system: request.system.clone(),
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        // No API call: a health probe should not spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TajerError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.complete_message(&api_request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion usage"
        );

        Ok(ProviderResponse {
            content: response.text(),
            id: response.id,
            model: response.model,
            stop_reason: response.stop_reason,
        })
    }
}

/// Resolves the API key from config, falling back to `ANTHROPIC_API_KEY`.
fn resolve_api_key(config_key: Option<&str>) -> Result<String, TajerError> {
    if let Some(key) = config_key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            TajerError::Config(
                "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
            )
        })
}
