use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const MIN_SECRET_LEN: usize = 32;

pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub bot_token: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("RELAY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("RELAY_JWT_SECRET is unset or still a placeholder");
        }
        if jwt_secret.len() < MIN_SECRET_LEN {
            bail!("RELAY_JWT_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let ttl_minutes: u64 = get("RELAY_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("RELAY_TOKEN_TTL_MINUTES must be a whole number of minutes")?;
        if ttl_minutes == 0 {
            bail!("RELAY_TOKEN_TTL_MINUTES must be at least 1");
        }
        let token_ttl = ttl_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .context("RELAY_TOKEN_TTL_MINUTES is too large")?;

        let db_path: PathBuf = get("RELAY_DB_PATH").unwrap_or_else(|| "relay.db".into()).into();

        let host = get("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("RELAY_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("RELAY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

        let bot_token = get("RELAY_BOT_TOKEN").filter(|t| !t.is_empty());

        let admin = match (get("RELAY_ADMIN_USERNAME"), get("RELAY_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (None, None) => None,
            _ => bail!("RELAY_ADMIN_USERNAME and RELAY_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            jwt_secret,
            token_ttl,
            db_path,
            addr,
            bot_token,
            admin,
        })
    }
}
