// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Tajer dialogue engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a message delivered through a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Erp,
}

/// Languages the dialogue engine can converse in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Arabic, including Lebanese written in Latin transliteration.
    Ar,
    /// English. Also the catalog's primary language.
    En,
    /// French.
    Fr,
}

impl Language {
    /// All supported languages, in a stable order.
    pub const ALL: [Language; 3] = [Language::Ar, Language::En, Language::Fr];
}

// --- Customers ---

/// A customer, keyed by normalized phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// Canonical international phone number (`+<digits>`).
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub language: Option<Language>,
    /// Linkage code of the matching ERP account, if any.
    pub erp_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Contact fields collected during a guided order, applied when the order commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

impl ContactUpdate {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.email.is_none()
    }
}

// --- Catalog ---

/// A catalog entry. Read-only from the dialogue engine's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: f64,
    /// Units available right now.
    pub quantity: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Product fields accepted by catalog upserts (import, tests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

// --- Orders ---

/// Lifecycle status of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Completed,
}

/// One product line of an order. Unit price is copied at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub total: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItem>,
}

/// Everything needed to commit an order in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
    /// Contact fields to write onto the customer record in the same transaction.
    pub contact: ContactUpdate,
}

impl NewOrder {
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

// --- Message log ---

/// Direction of a logged exchange.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// Append-only record of one inbound or outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: i64,
    pub customer_id: i64,
    pub direction: MessageDirection,
    pub body: String,
    pub created_at: String,
}

// --- Conversation state ---

/// Raw persisted conversation row. The dialogue crate owns the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub customer_id: i64,
    /// FSM state tag.
    pub state: String,
    /// State payload as a JSON object.
    pub data: serde_json::Value,
    /// Last resolved conversation language.
    pub language: Option<Language>,
    /// Incremented on every write.
    pub version: i64,
    pub updated_at: String,
}

// --- Channel types ---

/// Body of an outbound gateway message.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Text(String),
    Image { url: String, caption: Option<String> },
}

/// A message to be delivered to one phone number.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Canonical international phone number.
    pub recipient: String,
    pub body: OutboundBody,
}

/// A text message received from the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundText {
    /// Sender phone as reported by the gateway (not yet normalized).
    pub sender: String,
    pub text: String,
    /// Gateway-assigned message id, when available.
    pub external_id: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_images: bool,
    pub max_message_length: Option<usize>,
}

// --- Provider types ---

/// A single message in a provider conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// A request to the AI fallback provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model override; `None` uses the provider's default.
    pub model: Option<String>,
    pub system: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
}

/// A complete response from the AI fallback provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: Option<String>,
}

// --- ERP types ---

/// An item as known by the ERP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpItem {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// A customer account as known by the ERP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpAccount {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One line of an ERP sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl From<&OrderItem> for SaleLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_code: item.product_code.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}
