use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Resolve the bearer token to a user and attach it to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        debug!("Missing or malformed Authorization header: {}", e);
        ApiError::Unauthorized("Could not validate credentials")
    })?;

    let token = bearer.token().to_string();
    let st = state.clone();
    let user = run_blocking(move || Ok(st.auth.authenticate_by_token(&token)?)).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
