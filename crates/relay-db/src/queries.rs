use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use relay_types::models::{RequestFilter, RequestRecord, Role, User};

use crate::Database;
use crate::models::{RequestRow, UserRow, format_timestamp};

const USER_COLUMNS: &str =
    "u.id, u.username, u.password, r.name, u.manager_id, u.created_at
     FROM users u
     JOIN roles r ON u.role_id = r.id";

const REQUEST_COLUMNS: &str = "id, bottoken, chatid, message, user_id, created_at FROM requests";

impl Database {
    // -- Users --

    /// Inserts a user, creating its role row on first use. Role and user are
    /// written in one transaction. Returns `None` if the username is taken.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        manager_id: Option<Uuid>,
    ) -> Result<Option<User>> {
        let id = Uuid::new_v4();
        let created_at = chrono::Utc::now();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let role_id = get_or_create_role(&tx, role.as_str())?;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO users (id, username, password, role_id, manager_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id.to_string(),
                    username,
                    password_hash,
                    role_id,
                    manager_id.map(|m| m.to_string()),
                    format_timestamp(created_at),
                ],
            )?;

            if inserted == 0 {
                // dropping `tx` rolls back a role row created above
                return Ok(None);
            }

            tx.commit()?;

            Ok(Some(User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role: role.as_str().to_string(),
                manager_id,
                created_at,
            }))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_user(conn, &format!("SELECT {USER_COLUMNS} WHERE u.username = ?1"), username)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_user(conn, &format!("SELECT {USER_COLUMNS} WHERE u.id = ?1"), &id.to_string())
        })
    }

    pub fn get_direct_reports(&self, manager_id: Uuid) -> Result<Vec<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users WHERE manager_id = ?1")?;
            let ids = stmt
                .query_map([manager_id.to_string()], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            ids.iter()
                .map(|id| id.parse::<Uuid>().map_err(anyhow::Error::from))
                .collect()
        })
    }

    // -- Requests --

    pub fn insert_request(
        &self,
        bottoken: &str,
        chatid: &str,
        message: &str,
        user_id: Option<Uuid>,
    ) -> Result<RequestRecord> {
        let record = RequestRecord {
            id: Uuid::new_v4(),
            bottoken: bottoken.to_string(),
            chatid: chatid.to_string(),
            message: message.to_string(),
            user_id,
            created_at: chrono::Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO requests (id, bottoken, chatid, message, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    record.id.to_string(),
                    record.bottoken,
                    record.chatid,
                    record.message,
                    record.user_id.map(|u| u.to_string()),
                    format_timestamp(record.created_at),
                ],
            )?;
            Ok(())
        })?;

        Ok(record)
    }

    pub fn get_request(&self, id: Uuid) -> Result<Option<RequestRecord>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {REQUEST_COLUMNS} WHERE id = ?1"),
                    [id.to_string()],
                    request_row,
                )
                .optional()?;

            row.map(RequestRecord::try_from).transpose()
        })
    }

    /// Rows matching `filter`, newest first.
    pub fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<RequestRecord>> {
        let (clause, params): (String, Vec<String>) = match filter {
            RequestFilter::All => (String::new(), vec![]),
            RequestFilter::OwnedBy(id) => ("WHERE user_id = ?1".to_string(), vec![id.to_string()]),
            RequestFilter::OwnedByAny(ids) if ids.is_empty() => return Ok(vec![]),
            RequestFilter::OwnedByAny(ids) => {
                let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
                (
                    format!("WHERE user_id IN ({})", placeholders.join(", ")),
                    ids.iter().map(Uuid::to_string).collect(),
                )
            }
        };

        self.with_conn(|conn| {
            let sql = format!("SELECT {REQUEST_COLUMNS} {clause} ORDER BY created_at DESC, rowid DESC");
            let mut stmt = conn.prepare(&sql)?;

            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), request_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(RequestRecord::try_from).collect()
        })
    }
}

fn get_or_create_role(conn: &Connection, name: &str) -> Result<String> {
    conn.execute(
        "INSERT OR IGNORE INTO roles (id, name) VALUES (?1, ?2)",
        (Uuid::new_v4().to_string(), name),
    )?;

    let id = conn.query_row("SELECT id FROM roles WHERE name = ?1", [name], |row| row.get(0))?;
    Ok(id)
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(sql)?;

    let row = stmt
        .query_row([key], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                manager_id: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    row.map(User::try_from).transpose()
}

fn request_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        id: row.get(0)?,
        bottoken: row.get(1)?,
        chatid: row.get(2)?,
        message: row.get(3)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}
