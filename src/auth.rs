use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::Role,
    token::{TokenCodec, TokenError},
};

/// Identity
///
/// The resolved, trusted actor for one request, derived entirely from a
/// verified token. Produced fresh per request and never persisted; its
/// lifetime is the request it authenticated.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Authentication Gate
///
/// Implements Axum's FromRequestParts trait, making Identity usable as a
/// function argument in any protected handler. The gate is a terminal-on-first-
/// failure sequence:
/// 1. No Authorization header       -> MissingCredential
/// 2. Not `Bearer <non-empty>`      -> MalformedCredential
/// 3. Codec says expired            -> ExpiredCredential
/// 4. Codec says invalid/malformed  -> InvalidCredential
/// 5. Otherwise the claims become the Identity.
///
/// All four failures share one external 401; the variant is only visible in
/// logs. Authentication is stateless and re-attempted per request by the
/// caller, never retried here.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::MissingCredential)?;

        let auth_header = auth_header
            .to_str()
            .map_err(|_| ApiError::MalformedCredential)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MalformedCredential)?;

        let claims = TokenCodec::from_config(&config)
            .verify(token)
            .map_err(|e| match e {
                TokenError::Expired => ApiError::ExpiredCredential,
                _ => ApiError::InvalidCredential,
            })?;

        Ok(Identity {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// RouteAccess
///
/// The per-operation role requirement, declared as data at registration time
/// rather than attached via middleware reflection. An empty set means any
/// authenticated identity passes; the gate is opt-in per operation.
///
/// Composition invariant: `authorize` takes `&Identity`, so the role gate is
/// unreachable unless the Authentication Gate already produced one.
#[derive(Debug, Clone, Copy)]
pub struct RouteAccess {
    pub required_roles: &'static [Role],
}

/// Operations any authenticated identity may call.
pub const ANY_AUTHENTICATED: RouteAccess = RouteAccess { required_roles: &[] };

/// Operations restricted to administrators.
pub const ADMIN_ONLY: RouteAccess = RouteAccess {
    required_roles: &[Role::Admin],
};

impl RouteAccess {
    pub fn authorize(&self, identity: &Identity) -> Result<(), ApiError> {
        if self.required_roles.is_empty() || self.required_roles.contains(&identity.role) {
            Ok(())
        } else {
            Err(ApiError::InsufficientRole)
        }
    }
}
