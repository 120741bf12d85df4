// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Tajer commerce bot.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and Elm-style diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use tajer_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Shop name: {}", config.shop.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TajerConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On any error: returns miette diagnostics pointing into the TOML files
pub fn load_and_validate() -> Result<TajerConfig, Vec<ConfigError>> {
    checked(loader::load_config(), &collect_toml_sources())
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<TajerConfig, Vec<ConfigError>> {
    let sources = std::fs::read_to_string(path)
        .map(|content| vec![(path.display().to_string(), content)])
        .unwrap_or_default();
    checked(loader::load_config_from_path(path), &sources)
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TajerConfig, Vec<ConfigError>> {
    let sources = vec![("<inline>".to_string(), toml_content.to_string())];
    checked(loader::load_config_from_str(toml_content), &sources)
}

fn checked(
    loaded: Result<TajerConfig, figment::Error>,
    sources: &diagnostic::TomlSources,
) -> Result<TajerConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, sources))?;
    validation::validate_config(&config).map_err(|errors| {
        errors
            .into_iter()
            .map(|error| error.with_sources(sources))
            .collect::<Vec<_>>()
    })?;
    Ok(config)
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string("tajer.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("tajer.toml").display().to_string())
            .unwrap_or_else(|_| "tajer.toml".to_string());
        sources.push((path, content));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("tajer/tajer.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    let system_path = std::path::Path::new("/etc/tajer/tajer.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
