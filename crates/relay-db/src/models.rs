//! Database row types. These map directly to SQLite rows and are converted
//! into relay-types models at the crate boundary.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use relay_types::models::{RequestRecord, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub manager_id: Option<String>,
    pub created_at: String,
}

pub struct RequestRow {
    pub id: String,
    pub bottoken: String,
    pub chatid: String,
    pub message: String,
    pub user_id: Option<String>,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            manager_id: row.manager_id.as_deref().map(parse_id).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
            username: row.username,
            password_hash: row.password,
            role: row.role,
        })
    }
}

impl TryFrom<RequestRow> for RequestRecord {
    type Error = anyhow::Error;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(RequestRecord {
            id: parse_id(&row.id)?,
            user_id: row.user_id.as_deref().map(parse_id).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
            bottoken: row.bottoken,
            chatid: row.chatid,
            message: row.message,
        })
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt id '{}'", raw))
}

/// Rows written by this crate use RFC 3339; rows written by hand with
/// `datetime('now')` use "YYYY-MM-DD HH:MM:SS" without a timezone.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
