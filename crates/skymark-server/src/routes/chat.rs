//! Conversation routes.

use super::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use skymark_types::{ConversationSummary, Message};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default, alias = "userId")]
    pub owner_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/chat/history/{ownerId} - Conversation summaries, newest first.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
) -> ApiResult<Vec<ConversationSummary>> {
    state
        .chat
        .history(&owner_id)
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to fetch chat history", e))
}

/// GET /api/chat/messages/{ownerId} - Messages, oldest first.
pub async fn messages(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
) -> ApiResult<Vec<Message>> {
    state
        .chat
        .messages(&owner_id)
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to fetch messages", e))
}

/// POST /api/chat/message - Answer a user message.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(req) = payload?;
    let text = req.message.unwrap_or_default();

    let reply = state
        .chat
        .send_message(&req.owner_id, &text)
        .await
        .map_err(|e| ApiError::from_core("Failed to process message", e))?;

    Ok(Json(MessageResponse { message: reply }))
}

/// DELETE /api/chat/history/{ownerId} - Remove all messages and summaries.
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
) -> ApiResult<MessageResponse> {
    state
        .chat
        .clear_history(&owner_id)
        .map_err(|e| ApiError::from_core("Failed to delete chat history", e))?;

    Ok(Json(MessageResponse {
        message: "Chat history deleted successfully".to_string(),
    }))
}
