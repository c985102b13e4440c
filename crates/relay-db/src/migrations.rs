use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (roles, users, requests)");
        conn.execute_batch(
            "
            CREATE TABLE roles (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE
            );

            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role_id     TEXT NOT NULL REFERENCES roles(id),
                manager_id  TEXT REFERENCES users(id),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_users_manager ON users(manager_id);

            CREATE TABLE requests (
                id          TEXT PRIMARY KEY,
                bottoken    TEXT NOT NULL,
                chatid      TEXT NOT NULL,
                message     TEXT NOT NULL,
                user_id     TEXT REFERENCES users(id),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_requests_user ON requests(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
