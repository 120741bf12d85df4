// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tajer config` command: prints the effective configuration.

use tajer_config::TajerConfig;
use tajer_core::TajerError;

const REDACTED: &str = "[redacted]";

pub fn run_config(config: &TajerConfig) -> Result<(), TajerError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| TajerError::Internal(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Copy of `config` with every credential replaced by a marker.
fn redacted(config: &TajerConfig) -> TajerConfig {
    fn hide(secret: &mut Option<String>) {
        if secret.is_some() {
            *secret = Some(REDACTED.to_string());
        }
    }

    let mut config = config.clone();
    hide(&mut config.anthropic.api_key);
    hide(&mut config.whatsapp.access_token);
    hide(&mut config.whatsapp.verify_token);
    hide(&mut config.whatsapp.app_secret);
    hide(&mut config.erp.api_key);
    config
}
