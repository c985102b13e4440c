//! Authentication and role-based authorization for the relay API.
//!
//! The flow for every protected call is: [`Authenticator`] resolves a bearer
//! token to a [`User`](relay_types::models::User), then [`access`] decides
//! what that user may do and which `requests` rows it may see. Storage is
//! reached only through the [`UserStore`] trait.

pub mod access;
pub mod authenticator;
pub mod error;
pub mod password;
pub mod store;
pub mod token;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use store::UserStore;
pub use token::TokenService;
