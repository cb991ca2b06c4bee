//! The fine-tuning preparation pipeline.

use crate::db::ChatStore;
use crate::provider::AiProvider;
use crate::training::{extract_examples, to_jsonl};
use crate::{Result, SkymarkError};
use chrono::Utc;
use skymark_types::{FineTuneJobRecord, FineTuningJob, FineTuningJobList, ACTIVE_MODEL_SETTING};
use std::sync::Arc;
use tracing::info;

/// Minimum number of stored messages before a training file is built.
pub const MIN_TRAINING_MESSAGES: u64 = 10;

/// Builds training files from chat history and manages provider jobs.
pub struct FineTuneService {
    store: Arc<ChatStore>,
    provider: Arc<dyn AiProvider>,
}

impl FineTuneService {
    pub fn new(store: Arc<ChatStore>, provider: Arc<dyn AiProvider>) -> Self {
        Self { store, provider }
    }

    /// Build the JSONL training payload from the full message store.
    pub fn build_training_file(&self) -> Result<String> {
        let found = self.store.count_messages()?;
        if found < MIN_TRAINING_MESSAGES {
            return Err(SkymarkError::InsufficientTrainingData {
                found,
                required: MIN_TRAINING_MESSAGES,
            });
        }

        let messages = self.store.all_messages()?;
        let examples = extract_examples(&messages);
        if examples.is_empty() {
            return Err(SkymarkError::InvalidTrainingData);
        }

        info!(
            target: "skymark::training",
            "Built {} training examples from {} messages",
            examples.len(),
            messages.len()
        );
        to_jsonl(&examples)
    }

    /// Upload the training file, start a job on `model` and record it locally.
    pub async fn create_job(&self, model: &str) -> Result<FineTuningJob> {
        let jsonl = self.build_training_file()?;

        let file = self.provider.upload_training_file(jsonl.into_bytes()).await?;
        info!(target: "skymark::training", "Uploaded training file {}", file.id);

        let job = self.provider.create_fine_tuning_job(&file.id, model).await?;
        self.store.insert_job_record(&FineTuneJobRecord {
            job_id: job.id.clone(),
            status: job.status.clone(),
            model: model.to_string(),
            created_at: Utc::now(),
            fine_tuned_model: job.fine_tuned_model.clone(),
        })?;

        info!(
            target: "skymark::training",
            "Created fine-tuning job {} on {} ({})",
            job.id,
            model,
            job.status
        );
        Ok(job)
    }

    pub async fn list_jobs(&self) -> Result<FineTuningJobList> {
        self.provider.list_fine_tuning_jobs().await
    }

    pub async fn job_status(&self, job_id: &str) -> Result<FineTuningJob> {
        if job_id.is_empty() || matches!(job_id, "." | "..") || job_id.contains(['/', '?', '#']) {
            return Err(SkymarkError::InvalidInput(format!("Invalid job id: {job_id}")));
        }
        self.provider.retrieve_fine_tuning_job(job_id).await
    }

    /// Switch chat completions to `model_id`.
    pub fn use_model(&self, model_id: &str) -> Result<()> {
        if model_id.trim().is_empty() {
            return Err(SkymarkError::InvalidInput("modelId is required".to_string()));
        }
        self.store.set_setting(ACTIVE_MODEL_SETTING, model_id)?;
        info!(target: "skymark::training", "Active chat model set to {}", model_id);
        Ok(())
    }
}
