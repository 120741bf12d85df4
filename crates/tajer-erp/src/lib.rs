// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ERP collaborator adapter for the Tajer commerce bot.
//!
//! Talks to the back-office JSON API:
//!
//! | Call            | Request                | Response                    |
//! |-----------------|------------------------|-----------------------------|
//! | `fetch_items`   | `GET {base}/items`     | `[ErpItem]`                 |
//! | `fetch_accounts`| `GET {base}/accounts`  | `[ErpAccount]`              |
//! | `create_sale`   | `POST {base}/sales`    | `{"invoice_id": "..."}`     |
//!
//! Every call is wrapped in a [`RetryPolicy`].

pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tajer_config::model::ErpConfig;
use tajer_core::types::{AdapterType, ErpAccount, ErpItem, HealthStatus, SaleLine};
use tajer_core::{ErpAdapter, PluginAdapter, TajerError};
use tracing::{debug, info};

pub use retry::{AttemptError, RetryPolicy};

#[derive(Debug, Serialize)]
struct SaleRequest<'a> {
    customer_code: &'a str,
    items: &'a [SaleLine],
    notes: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaleResponse {
    invoice_id: String,
}

/// HTTP ERP adapter implementing [`ErpAdapter`].
pub struct HttpErp {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl HttpErp {
    /// Creates the adapter. Requires `erp.base_url`.
    pub fn new(config: &ErpConfig) -> Result<Self, TajerError> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TajerError::Config("erp.base_url is required for ERP adapter".into()))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key)
                    .map_err(|e| TajerError::Config(format!("invalid ERP API key header value: {e}")))?,
            );
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TajerError::Erp {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let policy = RetryPolicy::from_config(config);
        info!(base_url, max_attempts = policy.max_attempts, "ERP adapter initialized");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            policy,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// One attempt: sends the request and classifies the failure.
    async fn attempt<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AttemptError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Transient(TajerError::Timeout {
                    duration: self.timeout,
                })
            } else {
                AttemptError::Transient(TajerError::Erp {
                    message: format!("ERP request failed: {e}"),
                    source: Some(Box::new(e)),
                })
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AttemptError::Transient(TajerError::Erp {
                message: format!("failed to read ERP response: {e}"),
                source: Some(Box::new(e)),
            })
        })?;
        debug!(status = %status, "ERP response received");

        if !status.is_success() {
            let err = TajerError::Erp {
                message: format!("ERP returned {status}: {body}"),
                source: None,
            };
            return Err(if is_transient(status) {
                AttemptError::Transient(err)
            } else {
                AttemptError::Permanent(err)
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            AttemptError::Permanent(TajerError::Erp {
                message: format!("unreadable ERP response: {e}"),
                source: Some(Box::new(e)),
            })
        })
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[async_trait]
impl PluginAdapter for HttpErp {
    fn name(&self) -> &str {
        "erp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Erp
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        match self.client.get(self.url("items")).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "ERP returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("ERP unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        Ok(())
    }
}

#[async_trait]
impl ErpAdapter for HttpErp {
    async fn fetch_items(&self) -> Result<Vec<ErpItem>, TajerError> {
        self.policy
            .run("fetch_items", || self.attempt(self.client.get(self.url("items"))))
            .await
    }

    async fn fetch_accounts(&self) -> Result<Vec<ErpAccount>, TajerError> {
        self.policy
            .run("fetch_accounts", || {
                self.attempt(self.client.get(self.url("accounts")))
            })
            .await
    }

    async fn create_sale(
        &self,
        customer_code: &str,
        items: &[SaleLine],
        notes: &str,
    ) -> Result<String, TajerError> {
        let body = SaleRequest {
            customer_code,
            items,
            notes,
        };
        let response: SaleResponse = self
            .policy
            .run("create_sale", || {
                self.attempt(self.client.post(self.url("sales")).json(&body))
            })
            .await?;
        info!(customer_code, invoice_id = %response.invoice_id, "ERP sale created");
        Ok(response.invoice_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ErpConfig {
        ErpConfig {
            base_url: Some(base_url.to_string()),
            api_key: Some("erp-key".into()),
            max_attempts: 3,
            base_delay_ms: 5,
            max_total_wait_ms: 100,
            timeout_secs: 5,
        }
    }

    #[test]
    fn new_requires_base_url() {
        let cfg = ErpConfig::default();
        assert!(matches!(HttpErp::new(&cfg), Err(TajerError::Config(_))));
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn fetch_items_parses_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header("x-api-key", "erp-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"code": "P-1", "name": "Blue pen", "price": 0.5, "quantity": 120},
                {"code": "NB-1", "name": "Red notebook", "price": 3.0, "quantity": 4}
            ])))
            .mount(&server)
            .await;

        let erp = HttpErp::new(&config(&server.uri())).unwrap();
        let items = erp.fetch_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].code, "NB-1");
        assert_eq!(items[1].quantity, 4);
    }

    #[tokio::test]
    async fn fetch_accounts_tolerates_missing_phone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"code": "C-7", "name": "Rami", "phone": "+96170123456"},
                {"code": "C-8", "name": "Walk-in"}
            ])))
            .mount(&server)
            .await;

        let erp = HttpErp::new(&config(&server.uri())).unwrap();
        let accounts = erp.fetch_accounts().await.unwrap();
        assert_eq!(accounts[0].phone.as_deref(), Some("+96170123456"));
        assert!(accounts[1].phone.is_none());
    }

    #[tokio::test]
    async fn create_sale_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sales"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sales"))
            .and(body_partial_json(json!({
                "customer_code": "+96170123456",
                "items": [{"product_code": "NB-1", "quantity": 2, "unit_price": 3.0}],
                "notes": "WhatsApp order #1",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"invoice_id": "INV-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let erp = HttpErp::new(&config(&server.uri())).unwrap();
        let lines = vec![SaleLine {
            product_code: "NB-1".into(),
            quantity: 2,
            unit_price: 3.0,
        }];
        let invoice = erp
            .create_sale("+96170123456", &lines, "WhatsApp order #1")
            .await
            .unwrap();
        assert_eq!(invoice, "INV-9");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let erp = HttpErp::new(&config(&server.uri())).unwrap();
        let err = erp.fetch_items().await.unwrap_err();
        assert!(matches!(err, TajerError::Erp { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sales"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unknown customer"))
            .expect(1)
            .mount(&server)
            .await;

        let erp = HttpErp::new(&config(&server.uri())).unwrap();
        let err = erp.create_sale("C-404", &[], "note").await.unwrap_err();
        assert!(err.to_string().contains("422"), "got: {err}");
    }
}
