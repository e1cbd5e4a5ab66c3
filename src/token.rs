use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{config::AppConfig, models::Role};

/// Claims
///
/// The payload structure embedded inside every bearer token issued by this
/// service. Signed with the server secret and validated on every
/// authenticated request. The wire shape is stable:
/// `{sub, email, role, iat, exp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token malformed")]
    Malformed,
    #[error("token signing failed")]
    Signing,
}

/// TokenCodec
///
/// Signs and verifies the compact bearer token. Pure function of its inputs
/// and the configured secret: no IO, no per-request state.
pub struct TokenCodec {
    secret: String,
    ttl_secs: u64,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.token_ttl_secs)
    }

    /// Issues a signed token for the given identity, with `exp` computed from
    /// the configured ttl (7 days unless overridden).
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs as usize,
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &key).map_err(|e| {
            tracing::error!(error = ?e, "token signing failed");
            TokenError::Signing
        })
    }

    /// Verifies signature integrity before trusting any embedded claim, and
    /// independently checks `exp` against the current time with zero leeway:
    /// a well-signed but expired token must fail.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }),
        }
    }
}
