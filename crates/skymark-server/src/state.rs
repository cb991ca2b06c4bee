//! Shared application state.

use crate::config::Config;
use skymark_core::{AiProvider, ChatService, ChatStore, FineTuneService, OpenAiClient};
use std::sync::Arc;
use tracing::warn;

/// Shared application state.
pub struct AppState {
    pub chat: ChatService,
    pub fine_tune: FineTuneService,
    pub config: Config,
}

impl AppState {
    /// Open the store and connect the OpenAI client described by `config`.
    pub fn new(config: Config) -> skymark_core::Result<Self> {
        let api_key = config.api_key().unwrap_or_else(|| {
            warn!(target: "skymark::startup", "No OpenAI API key configured; provider calls will fail");
            String::new()
        });
        let provider = Arc::new(OpenAiClient::new(config.openai_base_url.clone(), api_key)?);
        Self::with_provider(config, provider)
    }

    /// Build state around an explicit provider.
    pub fn with_provider(config: Config, provider: Arc<dyn AiProvider>) -> skymark_core::Result<Self> {
        let store = Arc::new(ChatStore::open(&config.db_path)?);

        Ok(Self {
            chat: ChatService::new(store.clone(), provider.clone(), config.chat_settings()),
            fine_tune: FineTuneService::new(store, provider),
            config,
        })
    }
}
