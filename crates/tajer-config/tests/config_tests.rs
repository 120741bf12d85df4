// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tajer configuration system.

use tajer_config::diagnostic::{ConfigError, suggest_key};
use tajer_config::model::TajerConfig;
use tajer_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tajer_config() {
    let toml = r#"
[shop]
name = "Abou Karim Stationery"
log_level = "debug"
default_language = "ar"
default_country_code = "961"
opening_hours = "Mon-Sat 8:00-19:00"
address = "Hamra street, Beirut"
contact_phone = "+9611234567"
delivery_info = "Delivery across Beirut within 24h"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[dialogue]
page_size = 5
search_limit = 20
max_quantity = 200
collect_email = false

[[custom_answers]]
patterns = ["parking"]
answer = "Free parking behind the shop."

[anthropic]
api_key = "sk-ant-123"

[whatsapp]
access_token = "wa-token"
phone_number_id = "1234"
verify_token = "verify-me"

[erp]
base_url = "http://erp.local/api"
max_attempts = 3

[server]
bind_address = "0.0.0.0"
port = 9090
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.shop.name, "Abou Karim Stationery");
    assert_eq!(config.shop.log_level, "debug");
    assert_eq!(config.shop.default_language, "ar");
    assert_eq!(config.shop.delivery_info.as_deref(), Some("Delivery across Beirut within 24h"));
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.dialogue.page_size, 5);
    assert_eq!(config.dialogue.search_limit, 20);
    assert_eq!(config.dialogue.max_quantity, 200);
    assert!(!config.dialogue.collect_email);
    assert_eq!(config.custom_answers.len(), 1);
    assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-123"));
    assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("1234"));
    assert_eq!(config.erp.base_url.as_deref(), Some("http://erp.local/api"));
    assert_eq!(config.erp.max_attempts, 3);
    assert_eq!(config.server.port, 9090);
}

/// Unknown field in [shop] section produces an error naming the key.
#[test]
fn unknown_field_in_shop_produces_error() {
    let toml = r#"
[shop]
nmae = "test"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("nmae"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");

    assert_eq!(config.shop.name, "tajer");
    assert_eq!(config.shop.log_level, "info");
    assert_eq!(config.shop.default_language, "en");
    assert_eq!(config.shop.default_country_code, "961");
    assert!(config.shop.opening_hours.is_none());
    assert_eq!(config.dialogue.page_size, 10);
    assert_eq!(config.dialogue.search_limit, 50);
    assert_eq!(config.dialogue.max_quantity, 1000);
    assert_eq!(config.dialogue.min_name_chars, 2);
    assert_eq!(config.dialogue.min_address_chars, 5);
    assert_eq!(config.dialogue.returning_after_hours, 24);
    assert!(config.dialogue.collect_email);
    assert_eq!(config.dialogue.ai_snapshot_limit, 150);
    assert!(config.custom_answers.is_empty());
    assert!(config.anthropic.api_key.is_none());
    assert!(config.whatsapp.access_token.is_none());
    assert!(config.erp.base_url.is_none());
    assert_eq!(config.erp.max_attempts, 4);
    assert_eq!(config.erp.base_delay_ms, 500);
    assert_eq!(config.erp.max_total_wait_ms, 10_000);
    assert!(config.storage.wal_mode);
    assert_eq!(config.server.bind_address, "127.0.0.1");
}

/// Dot-notation keys (as produced by the env provider) reach nested fields.
#[test]
fn dotted_override_reaches_whatsapp_access_token() {
    use figment::{Figment, providers::Serialized};

    let config: TajerConfig = Figment::new()
        .merge(Serialized::defaults(TajerConfig::default()))
        .merge(("whatsapp.access_token", "xyz-from-env"))
        .extract()
        .expect("should set access_token via dot notation");

    assert_eq!(config.whatsapp.access_token.as_deref(), Some("xyz-from-env"));
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: TajerConfig = Figment::new()
        .merge(Serialized::defaults(TajerConfig::default()))
        .merge(Toml::file("/nonexistent/path/tajer.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.shop.name, "tajer");
}

/// An unknown top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown section");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telegram"),
        "got: {err_str}"
    );
}

#[test]
fn diagnostic_typo_suggests_page_size() {
    let suggestion = suggest_key("page_sise", &["page_size", "search_limit", "max_quantity"]);
    assert_eq!(suggestion, Some("page_size".to_string()));
}

/// Error output from load_and_validate_str includes the unknown key and a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[shop]
nmae = "test"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, section, suggestion, valid_keys, span, .. } if {
            key == "nmae"
                && section == "[shop]"
                && span.is_some()
                && suggestion.as_deref() == Some("name")
                && valid_keys.contains("default_language")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'nmae' with suggestion 'name', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[dialogue]
page_size = "ten"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("page_size"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "nmae".to_string(),
        section: "[shop]".to_string(),
        suggestion: Some("name".to_string()),
        valid_keys: "name, log_level, default_language".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `name`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("nmae"));
}

/// An unusable custom answer pattern is reported at its place in the file.
#[test]
fn custom_answer_pattern_error_points_at_the_pattern() {
    let toml = r#"
[[custom_answers]]
patterns = ["parking"]
answer = "Behind the shop."

[[custom_answers]]
patterns = ["wrap", "..."]
answer = "Free gift wrap."
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    let [ConfigError::CustomAnswer { index, span, .. }] = &errors[..] else {
        panic!("expected one custom answer error, got: {errors:?}");
    };
    assert_eq!(*index, 1);
    let span = span.expect("pattern is located");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "\"...\"");
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_bad_language_and_zero_page_size() {
    let toml = r#"
[shop]
default_language = "de"

[dialogue]
page_size = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
}

#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[shop]
name = "test"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.shop.name, "test");
}
