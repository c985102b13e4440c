use anyhow::Result;
use uuid::Uuid;

use relay_types::models::User;

/// Read access to user records. Implemented by the SQLite repository; errors
/// are storage failures only, a missing user is `Ok(None)`.
pub trait UserStore: Send + Sync {
    fn user_by_username(&self, username: &str) -> Result<Option<User>>;

    fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Ids of users whose `manager_id` is `manager_id`.
    fn direct_reports(&self, manager_id: Uuid) -> Result<Vec<Uuid>>;
}
