//! Common test utilities for route integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use skymark_core::{AiProvider, ChatCompletionRequest, ChatStore, Result, SkymarkError};
use skymark_server::{config::Config, routes, state::AppState};
use skymark_types::{FineTuningJob, FineTuningJobList, UploadedFile};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

/// In-process stand-in for the AI provider.
#[derive(Default)]
pub struct FakeProvider {
    /// When set, every call fails with this provider message.
    pub failure: Option<String>,
    pub completions: Mutex<Vec<ChatCompletionRequest>>,
    pub uploads: Mutex<Vec<String>>,
    pub created_jobs: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(SkymarkError::Provider {
                status: Some(500),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub fn job(id: &str, status: &str) -> FineTuningJob {
    FineTuningJob {
        id: id.to_string(),
        status: status.to_string(),
        model: Some("gpt-3.5-turbo".to_string()),
        fine_tuned_model: None,
        training_file: Some("file-test".to_string()),
        created_at: Some(1_714_557_600),
        extra: Default::default(),
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    async fn complete_chat(&self, request: ChatCompletionRequest) -> Result<String> {
        self.check()?;
        let last = request
            .messages
            .last()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        self.completions.lock().unwrap().push(request);
        Ok(format!("Advice about {last}"))
    }

    async fn upload_training_file(&self, jsonl: Vec<u8>) -> Result<UploadedFile> {
        self.check()?;
        self.uploads
            .lock()
            .unwrap()
            .push(String::from_utf8(jsonl).unwrap());
        Ok(UploadedFile {
            id: "file-test".to_string(),
            filename: Some("training_data.jsonl".to_string()),
            purpose: Some("fine-tune".to_string()),
            bytes: None,
        })
    }

    async fn create_fine_tuning_job(&self, training_file: &str, model: &str) -> Result<FineTuningJob> {
        self.check()?;
        self.created_jobs
            .lock()
            .unwrap()
            .push((training_file.to_string(), model.to_string()));
        Ok(job("ftjob-test", "validating_files"))
    }

    async fn list_fine_tuning_jobs(&self) -> Result<FineTuningJobList> {
        self.check()?;
        Ok(FineTuningJobList {
            object: Some("list".to_string()),
            data: vec![job("ftjob-test", "running")],
            has_more: false,
        })
    }

    async fn retrieve_fine_tuning_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.check()?;
        Ok(job(job_id, "succeeded"))
    }
}

/// Build the API router over a fresh database and the given provider.
pub fn create_test_app(provider: Arc<FakeProvider>) -> (Router, Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        port: 0,
        host: "127.0.0.1".to_string(),
        db_path: temp_dir.path().join("test.db"),
        static_dir: temp_dir.path().join("static"),
        ..Config::default()
    };

    let state = Arc::new(AppState::with_provider(config, provider).expect("Failed to create AppState"));
    let app = Router::new()
        .nest("/api", routes::api_router())
        .with_state(state.clone());

    (app, state, temp_dir)
}

/// Second connection to the test database, for seeding history directly.
pub fn open_store(dir: &TempDir) -> ChatStore {
    ChatStore::open(&dir.path().join("test.db")).unwrap()
}

/// Send a request and decode the JSON response.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
