// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the relational persistence backend.

use async_trait::async_trait;

use crate::error::TajerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ContactUpdate, ConversationRecord, Customer, Language, MessageDirection, NewOrder, Order,
    OrderStatus, Product, ProductUpsert,
};

/// Adapter for the storage backend.
///
/// Covers the five tables the dialogue engine touches: customers,
/// conversation state, products, orders (with items) and the message log.
/// Every failure is reported as [`TajerError::Storage`]; callers treat it
/// as fatal for the current request.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), TajerError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TajerError>;

    // --- Customers ---

    /// Point lookup by canonical phone number.
    async fn get_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, TajerError>;

    /// Point lookup by id.
    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, TajerError>;

    /// Returns the customer for `phone`, creating an empty record on first contact.
    async fn upsert_customer(&self, phone: &str) -> Result<Customer, TajerError>;

    /// Records the customer's preferred language.
    async fn update_customer_language(&self, id: i64, language: Language)
    -> Result<(), TajerError>;

    /// Writes the set fields of `contact` onto the customer record.
    async fn update_customer_contact(
        &self,
        id: i64,
        contact: &ContactUpdate,
    ) -> Result<(), TajerError>;

    // --- Conversation state ---

    /// Loads the conversation row, if one exists.
    async fn get_conversation(
        &self,
        customer_id: i64,
    ) -> Result<Option<ConversationRecord>, TajerError>;

    /// Replaces state and payload atomically.
    async fn put_conversation(
        &self,
        customer_id: i64,
        state: &str,
        data: &serde_json::Value,
    ) -> Result<(), TajerError>;

    /// Merges the keys of `patch` into the stored payload without changing state.
    async fn merge_conversation_data(
        &self,
        customer_id: i64,
        patch: &serde_json::Value,
    ) -> Result<(), TajerError>;

    /// Resets to `idle_state` with an empty payload, keeping the language.
    async fn clear_conversation(&self, customer_id: i64, idle_state: &str)
    -> Result<(), TajerError>;

    /// Records the conversation language on the state row.
    async fn set_conversation_language(
        &self,
        customer_id: i64,
        language: Language,
    ) -> Result<(), TajerError>;

    // --- Products ---

    /// Substring search over product names, in catalog order.
    async fn search_products(&self, term: &str, limit: usize) -> Result<Vec<Product>, TajerError>;

    /// Point lookup by product code.
    async fn get_product_by_code(&self, code: &str) -> Result<Option<Product>, TajerError>;

    /// A window of the catalog, in catalog order.
    async fn list_products(&self, offset: usize, limit: usize)
    -> Result<Vec<Product>, TajerError>;

    /// Number of products in the catalog.
    async fn count_products(&self) -> Result<usize, TajerError>;

    /// In-stock products in catalog order, at most `limit`.
    async fn list_in_stock_products(&self, limit: usize) -> Result<Vec<Product>, TajerError>;

    /// Inserts or updates a product by code.
    async fn upsert_product(&self, product: &ProductUpsert) -> Result<(), TajerError>;

    // --- Orders ---

    /// Writes the order, its items and the contact update in one transaction.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, TajerError>;

    /// Most recent orders first.
    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
        limit: usize,
    ) -> Result<Vec<Order>, TajerError>;

    async fn get_order(&self, id: i64) -> Result<Option<Order>, TajerError>;

    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), TajerError>;

    // --- Message log ---

    /// Appends one exchange to the message log.
    async fn append_message(
        &self,
        customer_id: i64,
        direction: MessageDirection,
        body: &str,
    ) -> Result<(), TajerError>;

    /// Timestamp (RFC 3339) of the customer's latest inbound message.
    async fn last_inbound_at(&self, customer_id: i64) -> Result<Option<String>, TajerError>;
}
