use std::sync::Arc;

use tracing::debug;

use relay_types::models::User;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::store::UserStore;
use crate::token::TokenService;

/// Resolves credentials (password or bearer token) to a stored user.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
    /// Verified against when the username is unknown, so a miss costs the
    /// same as a wrong password.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> anyhow::Result<Self> {
        let dummy_hash = hash_password("relay-unknown-user")?;
        Ok(Self {
            store,
            tokens,
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// `Ok(None)` for an unknown username and for a wrong password alike.
    pub fn authenticate_by_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        match self.store.user_by_username(username)? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
            Some(_) => {
                debug!("Password mismatch for '{}'", username);
                Ok(None)
            }
            None => {
                let _ = verify_password(password, &self.dummy_hash);
                debug!("Login attempt for unknown user '{}'", username);
                Ok(None)
            }
        }
    }

    /// Entry point for every protected operation.
    pub fn authenticate_by_token(&self, token: &str) -> Result<User, AuthError> {
        let subject = self
            .tokens
            .validate(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        self.store.user_by_username(&subject)?.ok_or_else(|| {
            debug!("Token subject '{}' no longer exists", subject);
            AuthError::Unauthenticated
        })
    }
}
