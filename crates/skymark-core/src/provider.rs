//! The external AI collaborator: chat completions and fine-tuning.

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use skymark_types::{ChatTurn, FineTuningJob, FineTuningJobList, UploadedFile};

/// Request body for the chat completions endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Completion and fine-tuning endpoints of a language-model provider.
///
/// Every call is a single round trip. Implementations do not retry.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Run a chat completion and return the assistant's reply text.
    async fn complete_chat(&self, request: ChatCompletionRequest) -> Result<String>;

    /// Upload a JSONL training file.
    async fn upload_training_file(&self, jsonl: Vec<u8>) -> Result<UploadedFile>;

    async fn create_fine_tuning_job(&self, training_file: &str, model: &str)
    -> Result<FineTuningJob>;

    async fn list_fine_tuning_jobs(&self) -> Result<FineTuningJobList>;

    async fn retrieve_fine_tuning_job(&self, job_id: &str) -> Result<FineTuningJob>;
}
