use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use relay_types::api::{CreateRequestRequest, RequestResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// POST /bot/requests: ingestion for the chat-bot front end.
///
/// The bot has no user account. It proves itself with the configured bot
/// token in the `bottoken` field, and its rows are stored without an owner,
/// which leaves them visible to Admins only.
pub async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<CreateRequestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(expected) = state.bot_token.as_deref() else {
        return Err(ApiError::NotFound("Bot ingestion is disabled".into()));
    };
    let Json(req) = body?;

    if !constant_time_eq(req.bottoken.as_bytes(), expected.as_bytes()) {
        warn!("Bot ingestion rejected for chat {}: bot token mismatch", req.chatid);
        return Err(ApiError::Unauthorized("Invalid bot token"));
    }

    let st = state.clone();
    let record = run_blocking(move || {
        Ok(st.db.insert_request(&req.bottoken, &req.chatid, &req.message, None)?)
    })
    .await?;

    info!("Bot relayed request {} for chat {}", record.id, record.chatid);
    Ok((StatusCode::CREATED, Json(RequestResponse::from(record))))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
