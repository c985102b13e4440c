use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The closed set of roles that can be granted to a user.
///
/// Parsing is case-insensitive; `as_str` is the canonical spelling stored in
/// the `roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A user account as the auth core sees it.
///
/// `role` holds the stored role name rather than a `Role` so a row carrying a
/// name outside the closed set can still be loaded, and is then denied.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Result<Role, UnknownRole> {
        self.role.parse()
    }
}

/// A relayed chat-bot message. `user_id` is `None` for rows written by the
/// bot ingestion path.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub id: Uuid,
    pub bottoken: String,
    pub chatid: String,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Which `requests` rows a caller may read.
///
/// The same value restricts list queries (translated to SQL by the
/// repository) and single-row reads (via [`RequestFilter::permits`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFilter {
    All,
    OwnedBy(Uuid),
    OwnedByAny(Vec<Uuid>),
}

impl RequestFilter {
    /// Ownerless rows only pass `All`.
    pub fn permits(&self, owner: Option<Uuid>) -> bool {
        match (self, owner) {
            (RequestFilter::All, _) => true,
            (_, None) => false,
            (RequestFilter::OwnedBy(id), Some(owner)) => *id == owner,
            (RequestFilter::OwnedByAny(ids), Some(owner)) => ids.contains(&owner),
        }
    }
}
