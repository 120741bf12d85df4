// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` and captures outbound messages
//! for assertion in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tajer_core::TajerError;
use tajer_core::traits::adapter::PluginAdapter;
use tajer_core::traits::channel::ChannelAdapter;
use tajer_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, MessageId, OutboundBody, OutboundMessage,
};

/// A mock messaging channel that records everything sent through it.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail_sends: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Text bodies sent to `phone`, in order.
    pub async fn texts_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient == phone)
            .filter_map(|m| match &m.body {
                OutboundBody::Text(text) => Some(text.clone()),
                OutboundBody::Image { .. } => None,
            })
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Make subsequent sends fail with a channel error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            max_message_length: None,
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TajerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TajerError::Channel {
                message: "mock channel send failure".into(),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }
}
