use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Form, Json,
    extract::{State, rejection::FormRejection},
};
use tracing::info;

use relay_auth::Authenticator;
use relay_db::Database;
use relay_types::api::{LoginForm, TokenResponse, UserSummary};
use relay_types::models::User;

use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub auth: Authenticator,
    /// Lifetime of tokens handed out by `/token`.
    pub token_ttl: Duration,
    /// Enables `/bot/requests` when set.
    pub bot_token: Option<String>,
}

/// POST /token: OAuth2 password grant.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form?;
    let st = state.clone();
    let user = run_blocking(move || {
        Ok(st.auth.authenticate_by_password(&form.username, &form.password)?)
    })
    .await?
    .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let token = state.auth.tokens().issue(&user.username, Some(state.token_ttl))?;

    info!("{} logged in", user.username);
    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /users/me
pub async fn me(Extension(user): Extension<User>) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}
