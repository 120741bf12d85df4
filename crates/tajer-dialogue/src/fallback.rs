// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI fallback: the request we send and the response grammar we accept.
//!
//! The model answers product questions with one of three shapes:
//!
//! - `CODES: P1, P2` when catalog products match,
//! - `NO_MATCH` when the shop doesn't sell it,
//! - anything else, relayed to the customer verbatim.
//!
//! No response shape is an error; unparseable text is free text.

use std::sync::Arc;

use tajer_core::types::{Language, Product, ProviderMessage, ProviderRequest};
use tajer_core::{ProviderAdapter, TajerError};
use tracing::debug;

pub const CODES_PREFIX: &str = "CODES:";
pub const NO_MATCH: &str = "NO_MATCH";

/// What the model said about a product question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiVerdict {
    /// Catalog codes, in the model's order.
    Codes(Vec<String>),
    NoMatch,
    FreeText(String),
    /// Blank answer or an empty code list.
    Empty,
}

pub fn parse_verdict(raw: &str) -> AiVerdict {
    let text = raw.trim();
    if text.is_empty() {
        return AiVerdict::Empty;
    }
    if text.eq_ignore_ascii_case(NO_MATCH) {
        return AiVerdict::NoMatch;
    }

    let prefix_len = CODES_PREFIX.len();
    let has_prefix = text
        .get(..prefix_len)
        .is_some_and(|head| head.eq_ignore_ascii_case(CODES_PREFIX));
    if !has_prefix {
        return AiVerdict::FreeText(text.to_string());
    }

    let codes: Vec<String> = text[prefix_len..]
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    if codes.is_empty() {
        AiVerdict::Empty
    } else {
        AiVerdict::Codes(codes)
    }
}

/// Compact `code | name | price` lines for the prompt.
pub fn catalog_snapshot(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| format!("{} | {} | {:.2}", p.code, p.name, p.price))
        .collect::<Vec<_>>()
        .join("\n")
}

fn language_name(language: Language) -> &'static str {
    match language {
        Language::Ar => "Arabic (use Lebanese dialect if the customer does)",
        Language::En => "English",
        Language::Fr => "French",
    }
}

/// Provider-backed fallback. Disabled when no provider is configured.
#[derive(Clone)]
pub struct AiFallback {
    provider: Option<Arc<dyn ProviderAdapter + Send + Sync>>,
    max_tokens: u32,
}

impl AiFallback {
    pub fn new(provider: Option<Arc<dyn ProviderAdapter + Send + Sync>>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    async fn ask(&self, system: String, message: &str) -> Result<Option<String>, TajerError> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        let response = provider
            .complete(ProviderRequest {
                model: None,
                system: Some(system),
                messages: vec![ProviderMessage {
                    role: "user".to_string(),
                    content: message.to_string(),
                }],
                max_tokens: self.max_tokens,
            })
            .await?;
        debug!(
            model = %response.model,
            stop_reason = ?response.stop_reason,
            "ai fallback answered"
        );
        Ok(Some(response.content))
    }

    /// Asks the model to match `message` against the in-stock snapshot.
    pub async fn classify(
        &self,
        message: &str,
        language: Language,
        catalog: &[Product],
    ) -> Result<AiVerdict, TajerError> {
        let system = format!(
            "You are the product assistant of a stationery shop. The customer writes in \
             Arabic, Lebanese arabizi, French or English.\n\
             In-stock catalog (code | name | price):\n{}\n\n\
             If the customer asks for products in this catalog, answer only with \
             `{CODES_PREFIX}` followed by the matching codes separated by commas.\n\
             If they ask for a product the catalog doesn't have, answer only `{NO_MATCH}`.\n\
             Otherwise answer briefly in {}.",
            catalog_snapshot(catalog),
            language_name(language),
        );
        Ok(self
            .ask(system, message)
            .await?
            .map_or(AiVerdict::Empty, |answer| parse_verdict(&answer)))
    }

    /// Last resort: a plain conversational answer.
    pub async fn converse(
        &self,
        message: &str,
        language: Language,
        shop_name: &str,
    ) -> Result<Option<String>, TajerError> {
        let system = format!(
            "You are the WhatsApp assistant of {shop_name}, a stationery shop. \
             Answer in {} in at most three short sentences. Never invent prices, \
             stock or order details; suggest typing a product name to search the catalog.",
            language_name(language),
        );
        Ok(self
            .ask(system, message)
            .await?
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty()))
    }
}
