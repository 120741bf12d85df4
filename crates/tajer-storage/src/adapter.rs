// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use tajer_config::model::StorageConfig;
use tajer_core::types::{
    ContactUpdate, ConversationRecord, Customer, Language, MessageDirection, NewOrder, Order,
    OrderStatus, Product, ProductUpsert,
};
use tajer_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, TajerError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, TajerError> {
        self.db.get().ok_or_else(|| TajerError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Links the customer with `phone` to an ERP account. Returns false if unknown.
    pub async fn link_erp_account(&self, phone: &str, erp_code: &str) -> Result<bool, TajerError> {
        queries::customers::set_erp_code(self.db()?, phone, erp_code).await
    }

    async fn checkpoint(&self) -> Result<(), TajerError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TajerError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TajerError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TajerError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Customers ---

    async fn get_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, TajerError> {
        queries::customers::get_by_phone(self.db()?, phone).await
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, TajerError> {
        queries::customers::get(self.db()?, id).await
    }

    async fn upsert_customer(&self, phone: &str) -> Result<Customer, TajerError> {
        queries::customers::upsert(self.db()?, phone).await
    }

    async fn update_customer_language(
        &self,
        id: i64,
        language: Language,
    ) -> Result<(), TajerError> {
        queries::customers::update_language(self.db()?, id, language).await
    }

    async fn update_customer_contact(
        &self,
        id: i64,
        contact: &ContactUpdate,
    ) -> Result<(), TajerError> {
        queries::customers::update_contact(self.db()?, id, contact).await
    }

    // --- Conversation state ---

    async fn get_conversation(
        &self,
        customer_id: i64,
    ) -> Result<Option<ConversationRecord>, TajerError> {
        queries::conversation::get(self.db()?, customer_id).await
    }

    async fn put_conversation(
        &self,
        customer_id: i64,
        state: &str,
        data: &serde_json::Value,
    ) -> Result<(), TajerError> {
        queries::conversation::put(self.db()?, customer_id, state, data).await
    }

    async fn merge_conversation_data(
        &self,
        customer_id: i64,
        patch: &serde_json::Value,
    ) -> Result<(), TajerError> {
        queries::conversation::merge_data(self.db()?, customer_id, patch).await
    }

    async fn clear_conversation(
        &self,
        customer_id: i64,
        idle_state: &str,
    ) -> Result<(), TajerError> {
        queries::conversation::clear(self.db()?, customer_id, idle_state).await
    }

    async fn set_conversation_language(
        &self,
        customer_id: i64,
        language: Language,
    ) -> Result<(), TajerError> {
        queries::conversation::set_language(self.db()?, customer_id, language).await
    }

    // --- Products ---

    async fn search_products(&self, term: &str, limit: usize) -> Result<Vec<Product>, TajerError> {
        queries::products::search(self.db()?, term, limit).await
    }

    async fn get_product_by_code(&self, code: &str) -> Result<Option<Product>, TajerError> {
        queries::products::get_by_code(self.db()?, code).await
    }

    async fn list_products(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Product>, TajerError> {
        queries::products::list(self.db()?, offset, limit).await
    }

    async fn count_products(&self) -> Result<usize, TajerError> {
        queries::products::count(self.db()?).await
    }

    async fn list_in_stock_products(&self, limit: usize) -> Result<Vec<Product>, TajerError> {
        queries::products::list_in_stock(self.db()?, limit).await
    }

    async fn upsert_product(&self, product: &ProductUpsert) -> Result<(), TajerError> {
        queries::products::upsert(self.db()?, product).await
    }

    // --- Orders ---

    async fn create_order(&self, order: &NewOrder) -> Result<Order, TajerError> {
        queries::orders::create(self.db()?, order).await
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
        limit: usize,
    ) -> Result<Vec<Order>, TajerError> {
        queries::orders::list_for_customer(self.db()?, customer_id, limit).await
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, TajerError> {
        queries::orders::get(self.db()?, id).await
    }

    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), TajerError> {
        queries::orders::update_status(self.db()?, id, status).await
    }

    // --- Message log ---

    async fn append_message(
        &self,
        customer_id: i64,
        direction: MessageDirection,
        body: &str,
    ) -> Result<(), TajerError> {
        queries::messages::append(self.db()?, customer_id, direction, body).await
    }

    async fn last_inbound_at(&self, customer_id: i64) -> Result<Option<String>, TajerError> {
        queries::messages::last_inbound_at(self.db()?, customer_id).await
    }
}
