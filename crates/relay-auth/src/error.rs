use relay_types::models::Role;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,

    /// Bad credentials, bad token, or a token whose subject no longer exists.
    /// Deliberately does not say which.
    #[error("could not validate credentials")]
    Unauthenticated,

    #[error("requires role {required}, caller has role {actual}")]
    RoleMismatch { required: Role, actual: String },

    #[error("role {0} has no access to requests")]
    UnknownRole(String),

    #[error("request is outside the caller's scope")]
    OutOfScope,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
