//! OpenAI-compatible HTTP implementation of [`AiProvider`].

use crate::provider::{AiProvider, ChatCompletionRequest};
use crate::{Result, SkymarkError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skymark_types::{FineTuningJob, FineTuningJobList, UploadedFile};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TRAINING_FILE_NAME: &str = "training_data.jsonl";

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    training_file: &'a str,
    model: &'a str,
}

/// OpenAI-style error envelope.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        // No request timeout: callers wait for the provider's terminal response.
        let http = Client::builder()
            .build()
            .map_err(|err| SkymarkError::provider(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a single job; the id is appended as one percent-encoded segment.
    fn job_url(&self, job_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/fine_tuning/jobs"))
            .map_err(|err| SkymarkError::provider(format!("invalid provider URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| SkymarkError::provider("provider URL cannot carry a path"))?
            .push(job_id);
        Ok(url)
    }

    /// Decode a JSON body, turning non-2xx statuses into provider errors.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(target: "skymark::provider", "Provider returned {}: {}", status, message);
            return Err(SkymarkError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn complete_chat(&self, request: ChatCompletionRequest) -> Result<String> {
        debug!(
            target: "skymark::provider",
            "Requesting completion from {} with {} turns",
            request.model,
            request.messages.len()
        );
        let response = self
            .http
            .post(self.url("/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let completion: CompletionResponse = Self::decode(response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SkymarkError::provider("completion returned no content"))
    }

    async fn upload_training_file(&self, jsonl: Vec<u8>) -> Result<UploadedFile> {
        debug!(target: "skymark::provider", "Uploading {} bytes of training data", jsonl.len());
        let part = Part::bytes(jsonl)
            .file_name(TRAINING_FILE_NAME)
            .mime_str("application/jsonl")?;
        let form = Form::new().text("purpose", "fine-tune").part("file", part);

        let response = self
            .http
            .post(self.url("/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_fine_tuning_job(
        &self,
        training_file: &str,
        model: &str,
    ) -> Result<FineTuningJob> {
        let response = self
            .http
            .post(self.url("/fine_tuning/jobs"))
            .bearer_auth(&self.api_key)
            .json(&CreateJobRequest {
                training_file,
                model,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_fine_tuning_jobs(&self) -> Result<FineTuningJobList> {
        let response = self
            .http
            .get(self.url("/fine_tuning/jobs"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn retrieve_fine_tuning_job(&self, job_id: &str) -> Result<FineTuningJob> {
        let response = self
            .http
            .get(self.job_url(job_id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }
}
