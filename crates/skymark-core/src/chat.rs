//! The conversational exchange pipeline.

use crate::context::{assemble_prompt, CONTEXT_WINDOW};
use crate::db::ChatStore;
use crate::provider::{AiProvider, ChatCompletionRequest};
use crate::{Result, SkymarkError};
use chrono::Utc;
use skymark_types::{ConversationSummary, Message, Origin, ACTIVE_MODEL_SETTING};
use std::sync::Arc;
use tracing::{debug, info};

/// Completion parameters used when no fine-tuned model has been selected.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Answers user utterances and keeps the exchange history.
pub struct ChatService {
    store: Arc<ChatStore>,
    provider: Arc<dyn AiProvider>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(store: Arc<ChatStore>, provider: Arc<dyn AiProvider>, settings: ChatSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    /// Send a user utterance and return the assistant's reply.
    ///
    /// Nothing is persisted unless the completion succeeds. The two message inserts
    /// and the summary upsert are independent writes.
    pub async fn send_message(&self, owner_id: &str, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(SkymarkError::InvalidInput("Message is required".to_string()));
        }
        if owner_id.trim().is_empty() {
            return Err(SkymarkError::InvalidInput("Owner id is required".to_string()));
        }

        let history = self.store.recent_messages(owner_id, CONTEXT_WINDOW)?;
        let messages = assemble_prompt(&history, text);
        let model = self.active_model()?;
        debug!(
            target: "skymark::chat",
            "Prompting {} for {} with {} prior turns",
            model,
            owner_id,
            history.len()
        );

        let reply = self
            .provider
            .complete_chat(ChatCompletionRequest {
                model,
                messages,
                temperature: Some(self.settings.temperature),
                max_tokens: Some(self.settings.max_tokens),
            })
            .await?;

        self.store
            .insert_message(&Message::new(owner_id, text, Origin::User))?;
        self.store
            .insert_message(&Message::new(owner_id, reply.as_str(), Origin::Assistant))?;
        self.store
            .upsert_conversation(owner_id, text, &reply, Utc::now())?;

        info!(target: "skymark::chat", "Answered message for {}", owner_id);
        Ok(reply)
    }

    /// The selected fine-tuned model, or the configured default.
    pub fn active_model(&self) -> Result<String> {
        Ok(self
            .store
            .get_setting(ACTIVE_MODEL_SETTING)?
            .map(|s| s.value)
            .unwrap_or_else(|| self.settings.default_model.clone()))
    }

    pub fn history(&self, owner_id: &str) -> Result<Vec<ConversationSummary>> {
        self.store.conversations_for_owner(owner_id)
    }

    pub fn messages(&self, owner_id: &str) -> Result<Vec<Message>> {
        self.store.messages_for_owner(owner_id)
    }

    pub fn clear_history(&self, owner_id: &str) -> Result<()> {
        let (messages, conversations) = self.store.delete_owner_history(owner_id)?;
        info!(
            target: "skymark::chat",
            "Cleared history for {} ({} messages, {} conversations)",
            owner_id,
            messages,
            conversations
        );
        Ok(())
    }
}
