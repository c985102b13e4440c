use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use relay_auth::access;
use relay_types::api::{CreateRequestRequest, RequestResponse};
use relay_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// POST /requests: the row is always attributed to the caller.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Result<Json<CreateRequestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    if !access::can_create_request(&user) {
        return Err(ApiError::Forbidden(format!(
            "Role {} may not create requests",
            user.role
        )));
    }

    let st = state.clone();
    let owner = user.id;
    let record = run_blocking(move || {
        Ok(st
            .db
            .insert_request(&req.bottoken, &req.chatid, &req.message, Some(owner))?)
    })
    .await?;

    info!("{} created request {}", user.username, record.id);
    Ok((StatusCode::CREATED, Json(RequestResponse::from(record))))
}

/// GET /requests: every row in the caller's read scope, newest first.
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let st = state.clone();
    let records = run_blocking(move || {
        let filter = access::scope_for_read(&*st.db, &user)?;
        debug!("{} reads requests with {:?}", user.username, filter);
        Ok(st.db.list_requests(&filter)?)
    })
    .await?;

    Ok(Json(records.into_iter().map(RequestResponse::from).collect()))
}

/// GET /requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<RequestResponse>, ApiError> {
    let st = state.clone();
    let record = run_blocking(move || {
        let record = st
            .db
            .get_request(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Request {} not found", id)))?;

        access::authorize_read(&*st.db, &user, &record)?;
        Ok(record)
    })
    .await?;

    Ok(Json(RequestResponse::from(record)))
}
