// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tajer commerce bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tajer configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TajerConfig {
    /// Shop identity and customer-facing details.
    #[serde(default)]
    pub shop: ShopConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dialogue engine tuning.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Shop-specific questions and their canned answers.
    #[serde(default)]
    pub custom_answers: Vec<CustomAnswerConfig>,

    /// AI fallback (Anthropic API) settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// WhatsApp Cloud API gateway settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// ERP collaborator settings.
    #[serde(default)]
    pub erp: ErpConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Shop identity and the facts the FAQ answers are built from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShopConfig {
    /// Display name used in greetings.
    #[serde(default = "default_shop_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Language used before a customer's language is known (`ar`, `en`, `fr`).
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Country calling code prepended to national phone numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    #[serde(default)]
    pub opening_hours: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub contact_phone: Option<String>,

    #[serde(default)]
    pub delivery_info: Option<String>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: default_shop_name(),
            log_level: default_log_level(),
            default_language: default_language(),
            default_country_code: default_country_code(),
            opening_hours: None,
            address: None,
            contact_phone: None,
            delivery_info: None,
        }
    }
}

fn default_shop_name() -> String {
    "tajer".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_country_code() -> String {
    "961".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tajer").join("tajer.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tajer.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Dialogue engine tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialogueConfig {
    /// Items per page in product lists.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum number of products a quick search returns.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Hard upper bound for a single order quantity.
    #[serde(default = "default_max_quantity")]
    pub max_quantity: i64,

    #[serde(default = "default_min_name_chars")]
    pub min_name_chars: usize,

    #[serde(default = "default_min_address_chars")]
    pub min_address_chars: usize,

    /// Hours since the last inbound message after which a greeting says "welcome back".
    #[serde(default = "default_returning_after_hours")]
    pub returning_after_hours: i64,

    /// Ask for an email after a newly collected address.
    #[serde(default = "default_collect_email")]
    pub collect_email: bool,

    /// Maximum catalog entries sent to the AI fallback.
    #[serde(default = "default_ai_snapshot_limit")]
    pub ai_snapshot_limit: usize,

    /// Optional TOML lexicon replacing the built-in translation tables.
    #[serde(default)]
    pub lexicon_path: Option<String>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_limit: default_search_limit(),
            max_quantity: default_max_quantity(),
            min_name_chars: default_min_name_chars(),
            min_address_chars: default_min_address_chars(),
            returning_after_hours: default_returning_after_hours(),
            collect_email: default_collect_email(),
            ai_snapshot_limit: default_ai_snapshot_limit(),
            lexicon_path: None,
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_search_limit() -> usize {
    50
}

fn default_max_quantity() -> i64 {
    1000
}

fn default_min_name_chars() -> usize {
    2
}

fn default_min_address_chars() -> usize {
    5
}

fn default_returning_after_hours() -> i64 {
    24
}

fn default_collect_email() -> bool {
    true
}

fn default_ai_snapshot_limit() -> usize {
    150
}

/// A shop-specific question/answer pair.
///
/// The answer is sent when the folded message contains any of the patterns
/// as a whole phrase.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CustomAnswerConfig {
    pub patterns: Vec<String>,
    pub answer: String,
}

/// Anthropic API configuration for the AI fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` disables the AI fallback.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout. No retry beyond transient status codes.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_http_timeout_secs() -> u64 {
    20
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Bearer token. `None` disables outbound delivery.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default = "default_whatsapp_base_url")]
    pub api_base_url: String,

    /// Token echoed back during webhook verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret used to check `X-Hub-Signature-256` on webhook posts.
    /// `None` accepts unsigned posts.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_base_url: default_whatsapp_base_url(),
            verify_token: None,
            app_secret: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_whatsapp_base_url() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

/// ERP collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ErpConfig {
    /// Base URL of the ERP JSON API. `None` disables ERP posting.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Total attempts per call, including the first.
    #[serde(default = "default_erp_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubled on each further retry.
    #[serde(default = "default_erp_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the summed backoff delays of one call.
    #[serde(default = "default_erp_max_total_wait_ms")]
    pub max_total_wait_ms: u64,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            max_attempts: default_erp_max_attempts(),
            base_delay_ms: default_erp_base_delay_ms(),
            max_total_wait_ms: default_erp_max_total_wait_ms(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_erp_max_attempts() -> u32 {
    4
}

fn default_erp_base_delay_ms() -> u64 {
    500
}

fn default_erp_max_total_wait_ms() -> u64 {
    10_000
}

/// Webhook server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}
