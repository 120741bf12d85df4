// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete dialogue stack with mock adapters,
//! a temp SQLite database and a seeded catalog. Provides `send()` to drive
//! the full engine pipeline in tests.

use std::sync::Arc;

use tajer_config::model::TajerConfig;
use tajer_core::types::{ContactUpdate, Customer, OutboundBody, OutboundMessage, ProductUpsert};
use tajer_core::{ChannelAdapter, ErpAdapter, ProviderAdapter, StorageAdapter, TajerError};
use tajer_dialogue::{ConversationState, DialogueEngine, Reply};
use tajer_storage::SqliteStorage;

use crate::mock_channel::MockChannel;
use crate::mock_erp::MockErp;
use crate::mock_provider::MockProvider;

/// Phone number used by tests that only need one customer.
pub const TEST_PHONE: &str = "+96170123456";

/// The catalog every harness starts with unless seeding is disabled.
///
/// Pens come first so that a search for "pen" yields at least three hits.
pub fn default_catalog() -> Vec<ProductUpsert> {
    let product = |code: &str, name: &str, price: f64, quantity: i64, image: Option<&str>| {
        ProductUpsert {
            code: code.to_string(),
            name: name.to_string(),
            price,
            quantity,
            category: None,
            image_url: image.map(str::to_string),
        }
    };
    vec![
        product("PEN-BL", "Blue pen", 0.5, 120, None),
        product("PEN-RD", "Red pen", 0.75, 80, None),
        product("PEN-GR", "Green pen", 1.0, 40, None),
        product("PEN-GD", "Gold pen", 12.0, 3, None),
        product(
            "NB-A4",
            "A4 notebook",
            3.5,
            25,
            Some("https://cdn.example.com/nb-a4.jpg"),
        ),
        product("RUL-30", "Ruler 30cm", 1.25, 0, None),
        product("GLUE-S", "Glue stick", 0.9, 60, None),
        product("ERS-1", "Eraser", 0.3, 200, None),
    ]
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: TajerConfig,
    responses: Vec<String>,
    with_provider: bool,
    with_erp: bool,
    catalog: Vec<ProductUpsert>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: TajerConfig::default(),
            responses: Vec::new(),
            with_provider: false,
            with_erp: false,
            catalog: default_catalog(),
        }
    }

    /// Adjust the configuration before the engine is built.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut TajerConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Attach a mock AI provider that answers with `responses` in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.with_provider = true;
        self.responses = responses;
        self
    }

    /// Attach a mock AI provider with an empty queue.
    pub fn with_provider(mut self) -> Self {
        self.with_provider = true;
        self
    }

    /// Attach a mock ERP that records posted sales.
    pub fn with_erp(mut self) -> Self {
        self.with_erp = true;
        self
    }

    /// Replace the seeded catalog.
    pub fn with_catalog(mut self, catalog: Vec<ProductUpsert>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, TajerError> {
        let temp_dir = tempfile::TempDir::new().map_err(TajerError::storage)?;
        self.config.storage.database_path =
            temp_dir.path().join("test.db").to_string_lossy().to_string();

        let storage = Arc::new(SqliteStorage::new(self.config.storage.clone()));
        storage.initialize().await?;
        for product in &self.catalog {
            storage.upsert_product(product).await?;
        }

        let lexicon = tajer_lang::load_lexicon(None)
            .map_err(|e| TajerError::Config(format!("built-in lexicon: {e}")))?;
        let mut engine = DialogueEngine::new(&self.config, lexicon, storage.clone())?;

        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));
        if self.with_provider {
            let provider: Arc<dyn ProviderAdapter + Send + Sync> = mock_provider.clone();
            engine = engine.with_provider(provider);
        }

        let mock_erp = Arc::new(MockErp::new());
        if self.with_erp {
            let erp: Arc<dyn ErpAdapter + Send + Sync> = mock_erp.clone();
            engine = engine.with_erp(erp);
        }

        Ok(TestHarness {
            engine: Arc::new(engine),
            storage,
            mock_provider,
            mock_erp,
            mock_channel: Arc::new(MockChannel::new()),
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub engine: Arc<DialogueEngine>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub mock_provider: Arc<MockProvider>,
    pub mock_erp: Arc<MockErp>,
    /// Receives replies sent through [`TestHarness::deliver`].
    pub mock_channel: Arc<MockChannel>,
    pub config: TajerConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one inbound message through the engine and return the reply.
    pub async fn send(&self, phone: &str, text: &str) -> Reply {
        self.engine.handle_message(phone, text).await
    }

    /// Like [`send`](Self::send), then delivers the reply through the mock
    /// channel the way the webhook server does: image first, then text.
    pub async fn deliver(&self, phone: &str, text: &str) -> Result<Reply, TajerError> {
        let reply = self.send(phone, text).await;
        if let Some(image) = &reply.image {
            self.mock_channel
                .send(OutboundMessage {
                    recipient: phone.to_string(),
                    body: OutboundBody::Image {
                        url: image.url.clone(),
                        caption: image.caption.clone(),
                    },
                })
                .await?;
        }
        self.mock_channel.send_text(phone, &reply.text).await?;
        Ok(reply)
    }

    pub async fn customer(&self, phone: &str) -> Result<Option<Customer>, TajerError> {
        self.storage.get_customer_by_phone(phone).await
    }

    /// Current conversation state for `phone`. Unknown customers are idle.
    pub async fn state(&self, phone: &str) -> Result<ConversationState, TajerError> {
        match self.customer(phone).await? {
            Some(customer) => self.engine.store().state(customer.id).await,
            None => Ok(ConversationState::Idle),
        }
    }

    /// Creates `phone` as a customer with a known name and address.
    pub async fn register_customer(
        &self,
        phone: &str,
        name: &str,
        address: &str,
    ) -> Result<Customer, TajerError> {
        let customer = self.storage.upsert_customer(phone).await?;
        self.storage
            .update_customer_contact(
                customer.id,
                &ContactUpdate {
                    name: Some(name.to_string()),
                    address: Some(address.to_string()),
                    ..ContactUpdate::default()
                },
            )
            .await?;
        self.storage
            .get_customer(customer.id)
            .await?
            .ok_or_else(|| TajerError::Internal(format!("customer {phone} vanished")))
    }

    /// Moves every logged message of `phone` `hours` into the past.
    pub async fn backdate_messages(&self, phone: &str, hours: i64) -> Result<(), TajerError> {
        let customer = self
            .customer(phone)
            .await?
            .ok_or_else(|| TajerError::Internal(format!("unknown customer {phone}")))?;
        let modifier = format!("-{hours} hours");
        self.storage
            .db()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE messages
                     SET created_at = strftime('%Y-%m-%dT%H:%M:%fZ', created_at, ?2)
                     WHERE customer_id = ?1",
                    rusqlite::params![customer.id, modifier],
                )?;
                Ok(())
            })
            .await
            .map_err(TajerError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_seeded_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert_eq!(
            harness.storage.count_products().await.unwrap(),
            default_catalog().len()
        );
        assert!(harness.customer(TEST_PHONE).await.unwrap().is_none());
        assert!(harness.state(TEST_PHONE).await.unwrap().is_idle());
    }

    #[tokio::test]
    async fn empty_catalog_can_be_requested() {
        let harness = TestHarness::builder()
            .with_catalog(Vec::new())
            .build()
            .await
            .unwrap();
        assert_eq!(harness.storage.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deliver_sends_reply_through_channel() {
        let harness = TestHarness::builder().build().await.unwrap();
        let reply = harness.deliver(TEST_PHONE, "hello").await.unwrap();
        assert_eq!(harness.mock_channel.texts_to(TEST_PHONE).await, vec![reply.text]);
    }

    #[tokio::test]
    async fn backdating_moves_last_inbound_into_the_past() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.send(TEST_PHONE, "hello").await;
        let customer = harness.customer(TEST_PHONE).await.unwrap().unwrap();
        let before = harness.storage.last_inbound_at(customer.id).await.unwrap().unwrap();

        harness.backdate_messages(TEST_PHONE, 48).await.unwrap();
        let after = harness.storage.last_inbound_at(customer.id).await.unwrap().unwrap();
        assert!(after < before, "{after} should sort before {before}");
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();
        h1.send(TEST_PHONE, "hello").await;
        assert!(h1.customer(TEST_PHONE).await.unwrap().is_some());
        assert!(h2.customer(TEST_PHONE).await.unwrap().is_none());
    }
}
