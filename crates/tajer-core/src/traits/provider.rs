// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the AI fallback service.

use async_trait::async_trait;

use crate::error::TajerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for the language model used when deterministic search fails.
///
/// Calls are blocking from the dialogue's point of view: one request, one
/// complete response, bounded by the adapter's own timeout.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TajerError>;
}
