use anyhow::Result;
use tracing::{info, warn};

use relay_auth::password::hash_password;
use relay_db::Database;
use relay_types::models::Role;

use crate::config::AdminBootstrap;

/// Create the configured Admin account if no user has that username yet.
/// An existing user is never modified.
pub fn ensure_admin(db: &Database, admin: &AdminBootstrap) -> Result<()> {
    if let Some(existing) = db.get_user_by_username(&admin.username)? {
        if existing.role != Role::Admin.as_str() {
            warn!(
                "Bootstrap admin '{}' already exists with role {}; leaving it unchanged",
                existing.username, existing.role
            );
        }
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)?;
    match db.create_user(&admin.username, &password_hash, Role::Admin, None)? {
        Some(user) => info!("Created bootstrap admin '{}' ({})", user.username, user.id),
        None => info!("Bootstrap admin '{}' was created concurrently", admin.username),
    }

    Ok(())
}
