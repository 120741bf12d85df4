// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tajer.toml` > `~/.config/tajer/tajer.toml` > `/etc/tajer/tajer.toml`
//! with environment variable overrides via `TAJER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use tracing::{debug, trace};

use crate::model::TajerConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tajer/tajer.toml` (system-wide)
/// 3. `~/.config/tajer/tajer.toml` (user XDG config)
/// 4. `./tajer.toml` (local directory)
/// 5. `TAJER_*` environment variables
pub fn load_config() -> Result<TajerConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TajerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TajerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TajerConfig, figment::Error> {
    debug!(path = %path.display(), "loading config file");
    Figment::new()
        .merge(Serialized::defaults(TajerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(TajerConfig::default()));
    for path in config_files() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config file");
        } else {
            trace!(path = %path.display(), "config file not present");
        }
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Candidate config files, lowest precedence first.
fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/tajer/tajer.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("tajer/tajer.toml"));
    }
    files.push(PathBuf::from("tajer.toml"));
    files
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TAJER_WHATSAPP_ACCESS_TOKEN` must map to
/// `whatsapp.access_token`, not `whatsapp.access.token`.
fn env_provider() -> Env {
    Env::prefixed("TAJER_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("shop_", "shop.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("dialogue_", "dialogue.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("erp_", "erp.", 1)
            .replacen("server_", "server.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_override_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TAJER_WHATSAPP_ACCESS_TOKEN", "wa-token");
            jail.set_env("TAJER_DIALOGUE_PAGE_SIZE", "5");
            let config: TajerConfig = Figment::new()
                .merge(Serialized::defaults(TajerConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.whatsapp.access_token.as_deref(), Some("wa-token"));
            assert_eq!(config.dialogue.page_size, 5);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_the_last_file_source() {
        let files = config_files();
        assert_eq!(files.first(), Some(&PathBuf::from("/etc/tajer/tajer.toml")));
        assert_eq!(files.last(), Some(&PathBuf::from("tajer.toml")));
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("tajer.toml", "[dialogue]\npage_size = 7\n")?;
            let config: TajerConfig = build_figment().extract()?;
            assert_eq!(config.dialogue.page_size, 7);
            Ok(())
        });
    }
}
