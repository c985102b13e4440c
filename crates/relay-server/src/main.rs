mod bootstrap;
mod config;

use std::sync::Arc;

use tracing::info;

use relay_api::auth::{AppState, AppStateInner};
use relay_auth::{Authenticator, TokenService};
use relay_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=debug,relay_api=debug,relay_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    if let Some(admin) = &config.admin {
        bootstrap::ensure_admin(&db, admin)?;
    }

    let tokens = TokenService::new(config.jwt_secret.as_bytes());
    let auth = Authenticator::new(db.clone(), tokens)?;

    if config.bot_token.is_none() {
        info!("RELAY_BOT_TOKEN not set, bot ingestion disabled");
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        auth,
        token_ttl: config.token_ttl,
        bot_token: config.bot_token,
    });

    let app = relay_api::router(state);

    info!("Relay server listening on {}", config.addr);
    info!("Access tokens expire after {} minutes", config.token_ttl.as_secs() / 60);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
