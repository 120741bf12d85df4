// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for the Tajer commerce bot.
//!
//! Outbound replies go through the Graph API `/{phone_number_id}/messages`
//! endpoint with a single attempt per message. Inbound traffic arrives on
//! the webhook served by the `tajer` binary; [`webhook`] parses it.

pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tajer_config::model::WhatsAppConfig;
use tajer_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, MessageId, OutboundBody, OutboundMessage,
};
use tajer_core::{ChannelAdapter, PluginAdapter, TajerError};
use tracing::{debug, info};

/// Text bodies longer than this are rejected by the Cloud API.
pub const MAX_TEXT_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// WhatsApp channel implementing [`ChannelAdapter`].
pub struct WhatsAppChannel {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    timeout: Duration,
}

impl WhatsAppChannel {
    /// Creates a new WhatsApp channel adapter.
    ///
    /// Requires `whatsapp.access_token` and `whatsapp.phone_number_id`.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, TajerError> {
        let token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                TajerError::Config("whatsapp.access_token is required for WhatsApp adapter".into())
            })?;
        let phone_number_id = config
            .phone_number_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                TajerError::Config(
                    "whatsapp.phone_number_id is required for WhatsApp adapter".into(),
                )
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TajerError::Config(format!("invalid access token header value: {e}")))?,
        );

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TajerError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(phone_number_id, "WhatsApp channel initialized");
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            timeout,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.phone_number_id)
    }

    async fn post_message(&self, payload: &Value) -> Result<MessageId, TajerError> {
        let response = self
            .client
            .post(self.messages_url())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TajerError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    TajerError::Channel {
                        message: format!("WhatsApp send failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TajerError::Channel {
            message: format!("failed to read WhatsApp response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(TajerError::Channel {
                message: format!("WhatsApp API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body).map_err(|e| TajerError::Channel {
            message: format!("unreadable WhatsApp response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| TajerError::Channel {
                message: "WhatsApp response carried no message id".into(),
                source: None,
            })?;

        debug!(message_id = %id, "WhatsApp message accepted");
        Ok(MessageId(id))
    }
}

/// Builds the Graph API request body for one outbound message.
fn message_payload(msg: &OutboundMessage, text: Option<&str>) -> Value {
    let to = msg.recipient.trim_start_matches('+');
    match (&msg.body, text) {
        (_, Some(text)) => json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "body": text },
        }),
        (OutboundBody::Image { url, caption }, None) => {
            let mut image = json!({ "link": url });
            if let Some(caption) = caption {
                image["caption"] = json!(caption);
            }
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "image",
                "image": image,
            })
        }
        (OutboundBody::Text(text), None) => json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "body": text },
        }),
    }
}

/// Splits text into chunks of at most `max_chars` characters, preferring
/// line breaks as cut points.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            // A single line longer than the limit is cut on char boundaries.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        let url = format!("{}/{}", self.base_url, self.phone_number_id);
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Unhealthy(format!(
                "WhatsApp API returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "WhatsApp API unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        debug!("WhatsApp channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            max_message_length: Some(MAX_TEXT_CHARS),
        }
    }

    /// Sends one message. Long text is delivered as several messages; the
    /// id of the last one is returned.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TajerError> {
        match &msg.body {
            OutboundBody::Text(text) if text.chars().count() > MAX_TEXT_CHARS => {
                let mut last = None;
                for chunk in split_text(text, MAX_TEXT_CHARS) {
                    last = Some(self.post_message(&message_payload(&msg, Some(&chunk))).await?);
                }
                last.ok_or_else(|| TajerError::Internal("empty message split".into()))
            }
            _ => self.post_message(&message_payload(&msg, None)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: Some("wa-token".into()),
            phone_number_id: Some("1234".into()),
            api_base_url: base_url.to_string(),
            verify_token: None,
            app_secret: None,
            timeout_secs: 5,
        }
    }

    fn accepted(id: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": "96170123456", "wa_id": "96170123456"}],
            "messages": [{"id": id}],
        }))
    }

    #[test]
    fn new_requires_access_token() {
        let mut cfg = config("http://localhost");
        cfg.access_token = None;
        assert!(matches!(
            WhatsAppChannel::new(&cfg),
            Err(TajerError::Config(_))
        ));
    }

    #[test]
    fn new_rejects_empty_phone_number_id() {
        let mut cfg = config("http://localhost");
        cfg.phone_number_id = Some(String::new());
        assert!(WhatsAppChannel::new(&cfg).is_err());
    }

    #[test]
    fn split_prefers_line_breaks() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_text(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc"]);
    }

    #[test]
    fn split_cuts_overlong_lines_on_char_boundaries() {
        let text = "ببببببب";
        let chunks = split_text(text, 3);
        assert_eq!(chunks, vec!["ببب", "ببب", "ب"]);
    }

    #[tokio::test]
    async fn send_text_posts_to_messages_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1234/messages"))
            .and(header("authorization", "Bearer wa-token"))
            .and(body_partial_json(json!({
                "to": "96170123456",
                "type": "text",
                "text": {"body": "Welcome"},
            })))
            .respond_with(accepted("wamid.1"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let id = channel.send_text("+96170123456", "Welcome").await.unwrap();
        assert_eq!(id, MessageId("wamid.1".into()));
    }

    #[tokio::test]
    async fn send_image_includes_link_and_caption() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1234/messages"))
            .and(body_partial_json(json!({
                "type": "image",
                "image": {"link": "https://cdn.example/nb.jpg", "caption": "Red notebook"},
            })))
            .respond_with(accepted("wamid.2"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let id = channel
            .send_image(
                "+96170123456",
                "https://cdn.example/nb.jpg",
                Some("Red notebook"),
            )
            .await
            .unwrap();
        assert_eq!(id.0, "wamid.2");
    }

    #[tokio::test]
    async fn api_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let err = channel.send_text("+96170123456", "hi").await.unwrap_err();
        assert!(matches!(err, TajerError::Channel { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn slow_gateway_surfaces_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(accepted("wamid.3").set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.timeout_secs = 1;
        let channel = WhatsAppChannel::new(&cfg).unwrap();
        let err = channel.send_text("+96170123456", "hi").await.unwrap_err();
        assert!(matches!(err, TajerError::Timeout { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn long_text_is_sent_in_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1234/messages"))
            .respond_with(accepted("wamid.n"))
            .expect(2)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let line = format!("{}\n", "x".repeat(3000));
        let body = format!("{line}{line}");
        channel.send_text("+96170123456", &body).await.unwrap();
    }

    #[tokio::test]
    async fn health_check_reports_unhealthy_on_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1234"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let status = channel.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
