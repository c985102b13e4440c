use anyhow::Result;
use uuid::Uuid;

use relay_auth::UserStore;
use relay_types::models::User;

use crate::Database;

impl UserStore for Database {
    fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username(username)
    }

    fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.get_user_by_id(id)
    }

    fn direct_reports(&self, manager_id: Uuid) -> Result<Vec<Uuid>> {
        self.get_direct_reports(manager_id)
    }
}
