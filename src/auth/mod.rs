pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::PasswordHasher;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Bound user id
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, expiry_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::TokenGeneration(format!("token lifetime of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token is not available")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

/// Signs and verifies bearer credentials (HS256)
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: u64,
}

impl TokenSigner {
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.sign(&Claims::new(user_id, self.expiry_hours)?)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Check signature and expiry, yielding the bound user id
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let signer = TokenSigner::new("secret", 1);
        let user_id = Uuid::new_v4();
        let token = signer.issue(user_id).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenSigner::new("one", 1).issue(Uuid::new_v4()).unwrap();
        let err = TokenSigner::new("two", 1).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("secret", 1);
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        let token = signer.sign(&claims).unwrap();
        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        for hours in [u64::MAX, u64::MAX / 2, 1_000_000_000_000] {
            let err = TokenSigner::new("secret", hours).issue(Uuid::new_v4()).unwrap_err();
            assert!(matches!(err, AuthError::TokenGeneration(_)));
        }
    }

    #[test]
    fn malformed_and_empty_tokens_are_rejected() {
        let signer = TokenSigner::new("secret", 1);
        assert!(matches!(signer.verify("not-a-jwt"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(signer.verify("  "), Err(AuthError::MissingToken)));
    }
}
