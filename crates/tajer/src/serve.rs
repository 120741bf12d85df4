// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tajer serve` command implementation.
//!
//! Runs the WhatsApp webhook server:
//!
//! - `GET /webhook` answers the subscription handshake,
//! - `POST /webhook` runs each inbound text through the dialogue engine
//!   and sends the reply back through the Cloud API,
//! - `GET /health` reports liveness.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tajer_config::TajerConfig;
use tajer_core::types::{HealthStatus, OutboundBody, OutboundMessage};
use tajer_core::{ChannelAdapter, PluginAdapter, TajerError, normalize_phone};
use tajer_dialogue::{DialogueEngine, Reply};
use tajer_storage::SqliteStorage;
use tajer_whatsapp::WhatsAppChannel;
use tajer_whatsapp::webhook::{parse_webhook, verify_challenge, verify_signature};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::app;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct ServeState {
    pub engine: Arc<DialogueEngine>,
    pub channel: Arc<dyn ChannelAdapter + Send + Sync>,
    pub storage: Arc<SqliteStorage>,
    pub verify_token: Option<String>,
    /// When set, posts without a valid `X-Hub-Signature-256` are rejected.
    pub app_secret: Option<String>,
    pub default_country_code: String,
    pub started_at: Instant,
}

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

pub fn router(state: ServeState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the `tajer serve` command until Ctrl+C.
pub async fn run_serve(config: TajerConfig) -> Result<(), TajerError> {
    info!(shop = %config.shop.name, "starting tajer serve");

    let app = app::build(&config).await?;
    let channel: Arc<dyn ChannelAdapter + Send + Sync> =
        Arc::new(WhatsAppChannel::new(&config.whatsapp)?);

    if config.whatsapp.verify_token.is_none() {
        warn!("whatsapp.verify_token is not set; webhook subscription will be refused");
    }
    if config.whatsapp.app_secret.is_none() {
        warn!("whatsapp.app_secret is not set; webhook signatures are not checked");
    }

    let state = ServeState {
        engine: app.engine,
        channel,
        storage: app.storage.clone(),
        verify_token: config.whatsapp.verify_token.clone(),
        app_secret: config.whatsapp.app_secret.clone(),
        default_country_code: config.shop.default_country_code.clone(),
        started_at: Instant::now(),
    };

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TajerError::Channel {
            message: format!("failed to bind webhook server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!("webhook server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TajerError::Channel {
            message: format!("webhook server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    app.storage.shutdown().await?;
    info!("tajer serve shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

/// GET /webhook
async fn verify_webhook(
    State(state): State<ServeState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_challenge(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        state.verify_token.as_deref(),
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!("webhook verification refused");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook
///
/// Messages are handled in payload order before the response is sent, so
/// a failed delivery is visible in the logs of the same request.
async fn receive_webhook(
    State(state): State<ServeState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = state.app_secret.as_deref() {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, signature) {
            warn!("rejecting webhook post with invalid signature");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let messages = match parse_webhook(&body) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "rejecting malformed webhook post");
            return StatusCode::BAD_REQUEST;
        }
    };

    for inbound in messages {
        let Some(phone) = normalize_phone(&inbound.sender, &state.default_country_code) else {
            warn!(sender = %inbound.sender, "ignoring message from unusable phone number");
            continue;
        };
        debug!(phone = %phone, external_id = ?inbound.external_id, "inbound message");
        let reply = state.engine.handle_message(&phone, &inbound.text).await;
        if let Err(e) = deliver(state.channel.as_ref(), &phone, &reply).await {
            error!(phone = %phone, error = %e, "failed to deliver reply");
        }
    }

    StatusCode::OK
}

/// Sends a reply: the product image first when there is one, then the text.
pub async fn deliver(
    channel: &(dyn ChannelAdapter + Send + Sync),
    phone: &str,
    reply: &Reply,
) -> Result<(), TajerError> {
    if let Some(image) = &reply.image {
        if channel.capabilities().supports_images {
            let sent = channel
                .send(OutboundMessage {
                    recipient: phone.to_string(),
                    body: OutboundBody::Image {
                        url: image.url.clone(),
                        caption: image.caption.clone(),
                    },
                })
                .await;
            if let Err(e) = sent {
                // The text still names the product; losing the picture is tolerable.
                warn!(phone, error = %e, "failed to send product image");
            }
        }
    }
    channel.send_text(phone, &reply.text).await?;
    Ok(())
}

/// GET /health
async fn health(State(state): State<ServeState>) -> Json<HealthResponse> {
    let storage = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => "ok".to_string(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
        Err(e) => format!("error: {e}"),
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use tajer_test_utils::{MockChannel, TEST_PHONE, TestHarness};
    use tower::ServiceExt;

    fn state(harness: &TestHarness, channel: Arc<MockChannel>, secret: Option<&str>) -> ServeState {
        ServeState {
            engine: harness.engine.clone(),
            channel,
            storage: harness.storage.clone(),
            verify_token: Some("verify-me".into()),
            app_secret: secret.map(str::to_string),
            default_country_code: "961".into(),
            started_at: Instant::now(),
        }
    }

    fn text_payload(from: &str, body: &str) -> String {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"field": "messages", "value": {
                "messages": [{"from": from, "id": "wamid.1", "type": "text", "text": {"body": body}}]
            }}]}]
        })
        .to_string()
    }

    fn post(body: String, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("x-hub-signature-256", sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn verification_echoes_challenge() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = router(state(&harness, Arc::new(MockChannel::new()), None));

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"1158201444");

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn inbound_text_is_answered_through_the_channel() {
        let harness = TestHarness::builder().build().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let app = router(state(&harness, channel.clone(), None));

        // Gateway style sender without the leading +.
        let resp = app
            .oneshot(post(text_payload("96170123456", "hello"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let texts = channel.texts_to(TEST_PHONE).await;
        assert_eq!(texts.len(), 1);
        assert!(harness.customer(TEST_PHONE).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let app = router(state(&harness, channel.clone(), None));

        let resp = app.oneshot(post("{oops".into(), None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn signature_is_enforced_when_secret_is_configured() {
        let harness = TestHarness::builder().build().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let app = router(state(&harness, channel.clone(), Some("app-secret")));

        let body = text_payload("96170123456", "hello");
        let resp = app.clone().oneshot(post(body.clone(), None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(channel.sent_count().await, 0);

        let mut mac = Hmac::<Sha256>::new_from_slice(b"app-secret").unwrap();
        mac.update(body.as_bytes());
        let sig = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
        let resp = app.oneshot(post(body, Some(sig))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn image_is_sent_before_text() {
        let channel = Arc::new(MockChannel::new());
        let reply = Reply::with_image(
            "A4 notebook, 3.50. Reply 1 to confirm.",
            "https://cdn.example.com/nb-a4.jpg",
            Some("A4 notebook".into()),
        );
        let dyn_channel: Arc<dyn ChannelAdapter + Send + Sync> = channel.clone();
        deliver(dyn_channel.as_ref(), TEST_PHONE, &reply).await.unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0].body, OutboundBody::Image { .. }));
        assert!(matches!(sent[1].body, OutboundBody::Text(_)));
    }

    #[tokio::test]
    async fn health_reports_storage() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = router(state(&harness, Arc::new(MockChannel::new()), None));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["storage"], "ok");
    }
}
