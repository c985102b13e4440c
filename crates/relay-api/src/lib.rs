pub mod auth;
pub mod bot;
pub mod error;
pub mod middleware;
pub mod requests;
pub mod users;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let mut public_routes: Router<AppState> = Router::new()
        .route("/token", post(auth::login))
        .route("/health", get(health));

    if state.bot_token.is_some() {
        public_routes = public_routes.route("/bot/requests", post(bot::ingest));
    }

    let protected_routes: Router<AppState> = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/me", get(auth::me))
        .route(
            "/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route("/requests/{id}", get(requests::get_request))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run blocking repository or hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed"))
    })?
}
