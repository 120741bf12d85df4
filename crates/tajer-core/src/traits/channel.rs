// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging gateway (WhatsApp, test doubles).

use async_trait::async_trait;

use crate::error::TajerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, MessageId, OutboundBody, OutboundMessage};

/// Adapter for outbound delivery through a messaging gateway.
///
/// Inbound messages arrive through the gateway's webhook and are handed to
/// the dialogue engine by the server; adapters only deliver replies.
/// Recipients must already be in canonical international format.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TajerError>;

    /// Sends a plain text message.
    async fn send_text(&self, phone: &str, body: &str) -> Result<MessageId, TajerError> {
        self.send(OutboundMessage {
            recipient: phone.to_string(),
            body: OutboundBody::Text(body.to_string()),
        })
        .await
    }

    /// Sends an image by URL with an optional caption.
    async fn send_image(
        &self,
        phone: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, TajerError> {
        self.send(OutboundMessage {
            recipient: phone.to_string(),
            body: OutboundBody::Image {
                url: url.to_string(),
                caption: caption.map(str::to_string),
            },
        })
        .await
    }
}
