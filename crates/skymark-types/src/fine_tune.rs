//! Fine-tuning records, both local and as reported by the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChatTurn;

/// Setting key holding the name of the model used for chat completions.
pub const ACTIVE_MODEL_SETTING: &str = "openaiModel";

/// A key/value setting, singleton per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Local record of a submitted fine-tuning job.
///
/// Only written at submission time; the provider stays authoritative for status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineTuneJobRecord {
    pub job_id: String,
    pub status: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub fine_tuned_model: Option<String>,
}

/// One line of the training upload: a system turn followed by the accumulated turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ChatTurn>,
}

/// File object returned by the provider's upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Fine-tuning job as reported by the provider.
///
/// Unknown fields are preserved so the object can be handed back to callers as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuningJob {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Page of jobs from the provider's listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuningJobList {
    #[serde(default)]
    pub object: Option<String>,
    pub data: Vec<FineTuningJob>,
    #[serde(default)]
    pub has_more: bool,
}
