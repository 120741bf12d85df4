// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed conversation state and the store that persists it.
//!
//! Storage keeps a state tag and a JSON payload per customer. Here each
//! state owns exactly the fields it needs; the store converts between the
//! two and keeps the generic set/update/clear contract.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tajer_core::types::{Language, Product};
use tajer_core::{StorageAdapter, TajerError};
use tracing::warn;

/// A product as remembered between turns. Stock is re-read live before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub code: String,
    pub name: String,
    pub price: f64,
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            price: product.price,
        }
    }
}

/// Search results, kept whole so paging never re-queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub products: Vec<ProductRef>,
    pub page: usize,
    pub page_count: usize,
}

/// One page of the full catalog. Only the visible slice is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<ProductRef>,
    pub page: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingProduct {
    pub product: ProductRef,
}

/// An order being collected. `name` and `address` hold values gathered in
/// this flow only; known customer fields are not copied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub product: ProductRef,
    pub quantity: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Orders listed by the order-history view, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderChoices {
    pub order_ids: Vec<i64>,
}

/// The dialogue FSM.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingProductSelection(SearchResults),
    BrowsingCatalog(CatalogPage),
    ConfirmingProduct(PendingProduct),
    AwaitingQuantity(PendingProduct),
    AwaitingName(PendingOrder),
    AwaitingAddress(PendingOrder),
    AwaitingEmail(PendingOrder),
    AwaitingOrderCancel(OrderChoices),
}

impl ConversationState {
    pub const IDLE: &'static str = "idle";

    /// Tag stored in the `state` column.
    pub fn tag(&self) -> &'static str {
        match self {
            ConversationState::Idle => Self::IDLE,
            ConversationState::AwaitingProductSelection(_) => "awaiting_product_selection",
            ConversationState::BrowsingCatalog(_) => "browsing_catalog",
            ConversationState::ConfirmingProduct(_) => "confirming_product",
            ConversationState::AwaitingQuantity(_) => "awaiting_quantity",
            ConversationState::AwaitingName(_) => "awaiting_name",
            ConversationState::AwaitingAddress(_) => "awaiting_address",
            ConversationState::AwaitingEmail(_) => "awaiting_email",
            ConversationState::AwaitingOrderCancel(_) => "awaiting_order_cancel",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    /// States that expect free text (a name, an address, an email), where
    /// FAQ-style phrase matching would misfire.
    pub fn collects_free_text(&self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingName(_)
                | ConversationState::AwaitingAddress(_)
                | ConversationState::AwaitingEmail(_)
        )
    }

    fn payload(&self) -> Result<Value, serde_json::Error> {
        Ok(match serde_json::to_value(self)? {
            Value::Object(mut map) => map.remove("data").unwrap_or_else(|| json!({})),
            _ => json!({}),
        })
    }

    fn from_parts(tag: &str, data: &Value) -> Result<Self, serde_json::Error> {
        if tag == Self::IDLE {
            return Ok(ConversationState::Idle);
        }
        serde_json::from_value(json!({ "state": tag, "data": data }))
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A loaded conversation row.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub state: ConversationState,
    pub language: Option<Language>,
    pub version: i64,
}

/// Durable per-customer state. Storage failures propagate; there is no
/// in-memory fallback because state must survive between deliveries.
#[derive(Clone)]
pub struct ConversationStore {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Loads the conversation, defaulting to idle. A payload that no longer
    /// fits its state is dropped with a warning and reads as idle.
    pub async fn load(&self, customer_id: i64) -> Result<Conversation, TajerError> {
        let Some(record) = self.storage.get_conversation(customer_id).await? else {
            return Ok(Conversation {
                state: ConversationState::Idle,
                language: None,
                version: 0,
            });
        };

        let state = ConversationState::from_parts(&record.state, &record.data).unwrap_or_else(|e| {
            warn!(
                customer_id,
                state = %record.state,
                error = %e,
                "unreadable conversation payload, resetting to idle"
            );
            ConversationState::Idle
        });

        Ok(Conversation {
            state,
            language: record.language,
            version: record.version,
        })
    }

    pub async fn state(&self, customer_id: i64) -> Result<ConversationState, TajerError> {
        Ok(self.load(customer_id).await?.state)
    }

    /// Raw payload of the current state (`{}` when none).
    pub async fn data(&self, customer_id: i64) -> Result<Value, TajerError> {
        Ok(self
            .storage
            .get_conversation(customer_id)
            .await?
            .map_or_else(|| json!({}), |record| record.data))
    }

    /// Replaces state and payload.
    pub async fn set(&self, customer_id: i64, state: &ConversationState) -> Result<(), TajerError> {
        let data = state.payload().map_err(TajerError::storage)?;
        self.storage
            .put_conversation(customer_id, state.tag(), &data)
            .await
    }

    /// Merges `patch` into the payload, keeping the state.
    pub async fn update_data(&self, customer_id: i64, patch: &Value) -> Result<(), TajerError> {
        self.storage.merge_conversation_data(customer_id, patch).await
    }

    /// Back to idle with an empty payload.
    pub async fn clear(&self, customer_id: i64) -> Result<(), TajerError> {
        self.storage
            .clear_conversation(customer_id, ConversationState::IDLE)
            .await
    }

    pub async fn set_language(&self, customer_id: i64, language: Language) -> Result<(), TajerError> {
        self.storage
            .set_conversation_language(customer_id, language)
            .await
    }
}
