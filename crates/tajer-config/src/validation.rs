// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as known language codes, numeric country codes, and positive page sizes.

use std::path::Path;

use tajer_core::Language;

use crate::diagnostic::ConfigError;
use crate::model::TajerConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TajerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |key: &str, message: String| errors.push(ConfigError::validation(key, message));

    if config.shop.name.trim().is_empty() {
        invalid("shop.name", "must not be empty".to_string());
    }

    if config.shop.default_language.parse::<Language>().is_err() {
        invalid(
            "shop.default_language",
            format!("`{}` is not one of ar, en, fr", config.shop.default_language),
        );
    }

    let code = &config.shop.default_country_code;
    if code.is_empty() || code.len() > 4 || !code.chars().all(|c| c.is_ascii_digit()) {
        invalid(
            "shop.default_country_code",
            format!("`{code}` must be 1-4 digits without a leading +"),
        );
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path", "must not be empty".to_string());
    }

    let dialogue = &config.dialogue;
    if dialogue.page_size == 0 {
        invalid("dialogue.page_size", "must be at least 1".to_string());
    }
    if dialogue.search_limit == 0 {
        invalid("dialogue.search_limit", "must be at least 1".to_string());
    }
    if dialogue.max_quantity < 1 {
        invalid(
            "dialogue.max_quantity",
            format!("must be at least 1, got {}", dialogue.max_quantity),
        );
    }
    if dialogue.min_name_chars == 0 {
        invalid("dialogue.min_name_chars", "must be at least 1".to_string());
    }
    if dialogue.min_address_chars == 0 {
        invalid("dialogue.min_address_chars", "must be at least 1".to_string());
    }
    if dialogue.returning_after_hours < 0 {
        invalid(
            "dialogue.returning_after_hours",
            format!("must be non-negative, got {}", dialogue.returning_after_hours),
        );
    }

    for (i, custom) in config.custom_answers.iter().enumerate() {
        if custom.patterns.iter().all(|p| p.trim().is_empty()) {
            invalid(
                &format!("custom_answers[{i}].patterns"),
                "must contain a non-empty pattern".to_string(),
            );
        }
        if custom.answer.trim().is_empty() {
            invalid(&format!("custom_answers[{i}].answer"), "must not be empty".to_string());
        }
    }

    if config.erp.max_attempts == 0 {
        invalid("erp.max_attempts", "must be at least 1".to_string());
    }

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        invalid("server.bind_address", "must not be empty".to_string());
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(
                "server.bind_address",
                format!("`{addr}` is not a valid IP address or hostname"),
            );
        }
    }

    // Folding keeps only letters and digits, so anything else never matches.
    for (i, custom) in config.custom_answers.iter().enumerate() {
        for pattern in &custom.patterns {
            let blank = pattern.trim().is_empty();
            if !blank && !pattern.chars().any(char::is_alphanumeric) {
                errors.push(ConfigError::custom_answer(i, pattern, "it has no letters or digits"));
            }
        }
    }

    if let Some(path) = dialogue.lexicon_path.as_deref() {
        let path = Path::new(path);
        if !path.is_file() {
            errors.push(ConfigError::lexicon(path, "no such file", None));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
