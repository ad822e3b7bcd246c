//! Chat routes — one assistant turn per request.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::assistant::Stage;
use crate::services::intent::Intent;
use crate::services::transcript::{TranscriptEntry, TranscriptError};
use crate::state::AppState;

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// Omitted on the first message; the response carries a fresh id.
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub stage: Stage,
    pub intent: Intent,
}

/// `POST /api/chat` — send a message, get the assistant's reply.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, StatusCode> {
    if body.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    let session_id = match body.session_id {
        Some(id) if id.trim().is_empty() => return Err(StatusCode::BAD_REQUEST),
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    let outcome = state.assistant.handle_turn(&session_id, &body.message).await;
    Ok(Json(ChatResponse { session_id, reply: outcome.reply, stage: outcome.stage, intent: outcome.intent }))
}

/// `GET /api/chat/:session_id/history` — the session's persisted transcript.
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<TranscriptEntry>>, StatusCode> {
    let entries = state
        .assistant
        .transcripts()
        .history(&session_id)
        .await
        .map_err(transcript_error_to_status)?;
    Ok(Json(entries))
}

pub(crate) fn transcript_error_to_status(err: TranscriptError) -> StatusCode {
    tracing::warn!(error = %err, "chat: transcript read failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
