use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use relay_types::api::Claims;

use crate::error::AuthError;

/// Lifetime used when `issue` is called without an explicit TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Issues and validates HS256 bearer tokens with `{sub, exp}` claims.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked exactly, see `validate`.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> anyhow::Result<String> {
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        let exp = now()
            .checked_add(ttl.as_secs())
            .ok_or_else(|| anyhow::anyhow!("token lifetime of {}s is out of range", ttl.as_secs()))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Returns the token's subject. Does not check that the subject exists.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        // jsonwebtoken accepts exp == now; a token is valid strictly before exp.
        if data.claims.exp <= now() {
            debug!("Token for '{}' expired", data.claims.sub);
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims.sub)
    }
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
