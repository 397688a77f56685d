//! Bearer token verification.
//!
//! Tokens are HS256 JWTs issued by the external identity provider; the `sub`
//! claim is the caller's user id. Only signature and expiry are checked here.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use medfind_core::UserId;

/// Registered claims the API relies on. Times are seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token subject is not a valid user id")]
    InvalidSubject,

    #[error("invalid token: {0}")]
    Invalid(String),
}

pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<UserId, TokenValidationError>;
}

pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str) -> Result<UserId, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenValidationError::Expired,
            _ => TokenValidationError::Invalid(e.to_string()),
        })?;
        UserId::parse(data.claims.sub).map_err(|_| TokenValidationError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(secret: &str, sub: &str, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: sub.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_the_subject() {
        let validator = Hs256JwtValidator::new(b"secret");
        let user = validator.validate(&mint("secret", "google-oauth2|42", 600)).unwrap();
        assert_eq!(user.as_str(), "google-oauth2|42");
    }

    #[test]
    fn wrong_secret_expiry_and_blank_subject_are_rejected() {
        let validator = Hs256JwtValidator::new(b"secret");
        assert!(matches!(
            validator.validate(&mint("other", "u1", 600)),
            Err(TokenValidationError::Invalid(_))
        ));
        assert_eq!(
            validator.validate(&mint("secret", "u1", -60)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validator.validate(&mint("secret", "  ", 600)),
            Err(TokenValidationError::InvalidSubject)
        );
        assert!(validator.validate("not-a-jwt").is_err());
    }
}
