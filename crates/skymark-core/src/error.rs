//! Error types for Skymark.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkymarkError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not enough training data: found {found} messages, need at least {required}")]
    InsufficientTrainingData { found: u64, required: u64 },

    #[error("Could not create valid training examples from the chat history")]
    InvalidTrainingData,

    #[error("AI provider error: {message}")]
    Provider { status: Option<u16>, message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SkymarkError {
    pub fn provider(message: impl Into<String>) -> Self {
        SkymarkError::Provider {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the caller rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SkymarkError::InvalidInput(_)
                | SkymarkError::InsufficientTrainingData { .. }
                | SkymarkError::InvalidTrainingData
        )
    }
}

impl From<reqwest::Error> for SkymarkError {
    fn from(err: reqwest::Error) -> Self {
        SkymarkError::Provider {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
