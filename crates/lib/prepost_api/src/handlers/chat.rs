//! Chat request handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use prepost_core::protocol::{ChatRequest, ChatResponse};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::chat;

/// `POST /api/chat` — answer a question about the snapshots.
///
/// The body is read as JSON whatever its `Content-Type`.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ChatResponse>)> {
    let request = parse_request(&body)?;
    let (status, response) = chat::answer(&state, request).await?;
    Ok((status, Json(response)))
}

fn parse_request(body: &[u8]) -> AppResult<ChatRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("request body is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(AppError::Validation(
            "request body must be a JSON object".into(),
        ));
    }
    Ok(ChatRequest::from_json(&value))
}
