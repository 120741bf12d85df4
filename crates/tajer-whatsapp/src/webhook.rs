// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound side of the WhatsApp Cloud API: webhook payloads, the
//! subscription challenge, and `X-Hub-Signature-256` checks.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tajer_core::TajerError;
use tajer_core::types::InboundText;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Top-level webhook notification body.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: WebhookValue,
}

/// Payload of a single change. Status updates carry `statuses` instead of
/// `messages` and therefore yield nothing.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

impl WebhookPayload {
    /// Extracts the text messages in delivery order.
    pub fn into_texts(self) -> Vec<InboundText> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.changes)
            .flat_map(|change| change.value.messages)
            .filter_map(|msg| match (msg.kind.as_str(), msg.text) {
                ("text", Some(text)) => Some(InboundText {
                    sender: msg.from,
                    text: text.body,
                    external_id: msg.id,
                }),
                (kind, _) => {
                    debug!(kind, "ignoring non-text webhook message");
                    None
                }
            })
            .collect()
    }
}

/// Parses a raw webhook body into inbound text messages.
pub fn parse_webhook(body: &[u8]) -> Result<Vec<InboundText>, TajerError> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(|e| TajerError::Channel {
            message: format!("malformed webhook payload: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(payload.into_texts())
}

/// Answers the `GET` subscription handshake.
///
/// Returns the challenge to echo back when `hub.mode` is `subscribe` and
/// `hub.verify_token` matches the configured token. With no configured
/// token every handshake is refused.
pub fn verify_challenge(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: Option<&str>,
) -> Option<String> {
    let expected = expected_token.filter(|t| !t.is_empty())?;
    if mode == Some("subscribe") && token == Some(expected) {
        challenge.map(str::to_string)
    } else {
        None
    }
}

/// Checks an `X-Hub-Signature-256` header (`sha256=<hex>`) against the body.
pub fn verify_signature(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(sig_hex) = header.and_then(|h| h.strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
