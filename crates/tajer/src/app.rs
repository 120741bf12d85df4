// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by `serve` and `shell`: storage, lexicon, and the optional
//! AI and ERP collaborators around one [`DialogueEngine`].

use std::path::Path;
use std::sync::Arc;

use tajer_anthropic::AnthropicProvider;
use tajer_config::{ConfigError, TajerConfig};
use tajer_core::{ErpAdapter, ProviderAdapter, StorageAdapter, TajerError};
use tajer_dialogue::DialogueEngine;
use tajer_erp::HttpErp;
use tajer_lang::{CompiledLexicon, LexiconError};
use tajer_storage::SqliteStorage;
use tracing::info;

pub struct App {
    pub engine: Arc<DialogueEngine>,
    pub storage: Arc<SqliteStorage>,
}

/// Opens storage and builds the engine. Collaborators that are not
/// configured are left out: no API key means no AI fallback, no ERP URL
/// means orders stay local.
pub async fn build(config: &TajerConfig) -> Result<App, TajerError> {
    let storage = open_storage(config).await?;

    let lexicon = load_lexicon(config)?;
    let mut engine = DialogueEngine::new(config, lexicon, storage.clone())?;

    match AnthropicProvider::new(&config.anthropic) {
        Ok(provider) => {
            let provider: Arc<dyn ProviderAdapter + Send + Sync> = Arc::new(provider);
            engine = engine.with_provider(provider);
        }
        Err(TajerError::Config(reason)) => {
            info!(%reason, "AI fallback disabled");
        }
        Err(e) => return Err(e),
    }

    if config.erp.base_url.is_some() {
        let erp: Arc<dyn ErpAdapter + Send + Sync> = Arc::new(HttpErp::new(&config.erp)?);
        engine = engine.with_erp(erp);
    } else {
        info!("ERP posting disabled (no erp.base_url)");
    }

    Ok(App {
        engine: Arc::new(engine),
        storage,
    })
}

/// Loads the lexicon override, or the built-in one. Failures become
/// diagnostics pointing into the override file.
fn load_lexicon(config: &TajerConfig) -> Result<Arc<CompiledLexicon>, ConfigError> {
    let path = config.dialogue.lexicon_path.as_deref().map(Path::new);
    tajer_lang::load_lexicon(path).map_err(|e| {
        let span = match &e {
            LexiconError::Parse(parse) => parse.span(),
            _ => None,
        };
        ConfigError::lexicon(path.unwrap_or(Path::new("<built-in>")), e, span)
    })
}

pub async fn open_storage(config: &TajerConfig) -> Result<Arc<SqliteStorage>, TajerError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_lexicon_override_points_into_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lexicon.toml");
        std::fs::write(&file, "version = 1\n[intents.greeting\n").unwrap();
        let mut config = TajerConfig::default();
        config.dialogue.lexicon_path = Some(file.display().to_string());

        let err = load_lexicon(&config).map(|_| ()).unwrap_err();
        assert!(matches!(&err, ConfigError::Lexicon { span: Some(_), .. }), "{err:?}");
        let TajerError::Config(report) = TajerError::from(err) else {
            panic!("expected a config error");
        };
        assert!(report.contains("lexicon.toml"), "{report}");
    }

    #[test]
    fn builtin_lexicon_loads_without_an_override() {
        assert!(load_lexicon(&TajerConfig::default()).is_ok());
    }
}
