use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use relay_auth::UserStore;
use relay_auth::access::authorize_role;
use relay_auth::password::hash_password;
use relay_types::api::{CreateUserRequest, UserSummary};
use relay_types::models::{Role, User};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// POST /users: Admin only.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&caller, Role::Admin)?;
    let Json(req) = body?;

    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::BadRequest(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let role: Role = req.role_name.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "Invalid role '{}': expected Admin, Manager or User",
            req.role_name
        ))
    })?;

    let st = state.clone();
    let user = run_blocking(move || {
        if st.db.user_by_username(&req.username)?.is_some() {
            return Err(ApiError::BadRequest("Username already registered".into()));
        }

        if let Some(manager_id) = req.manager_id {
            let manager = st
                .db
                .user_by_id(manager_id)?
                .ok_or_else(|| ApiError::BadRequest(format!("Manager {} does not exist", manager_id)))?;

            if manager.role != Role::Manager.as_str() {
                return Err(ApiError::BadRequest(format!(
                    "User '{}' is not a Manager",
                    manager.username
                )));
            }
        }

        let password_hash = hash_password(&req.password)?;

        // The pre-check above can race another insert; the repository has the final word.
        st.db
            .create_user(&req.username, &password_hash, role, req.manager_id)?
            .ok_or_else(|| ApiError::BadRequest("Username already registered".into()))
    })
    .await?;

    info!("{} created user {} with role {}", caller.username, user.username, user.role);
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}
