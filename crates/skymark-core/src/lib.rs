//! Core chat, persistence and fine-tuning logic for Skymark.

mod chat;
mod context;
mod db;
mod error;
mod fine_tune;
mod openai;
mod provider;
mod training;

pub use chat::{ChatService, ChatSettings};
pub use context::{assemble_prompt, CONTEXT_WINDOW, SYSTEM_PROMPT};
pub use db::ChatStore;
pub use error::SkymarkError;
pub use fine_tune::{FineTuneService, MIN_TRAINING_MESSAGES};
pub use openai::{OpenAiClient, DEFAULT_BASE_URL};
pub use provider::{AiProvider, ChatCompletionRequest};
pub use training::{extract_examples, to_jsonl};

/// Result type for Skymark operations.
pub type Result<T> = std::result::Result<T, SkymarkError>;
