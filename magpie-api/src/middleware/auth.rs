use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use magpie_core::{AuthenticatedUser, Role};

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the authentication provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub exp: usize,
}

impl Claims {
    fn into_user(self) -> Option<AuthenticatedUser> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        let role = if self.role.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        };
        Some(AuthenticatedUser {
            id,
            email: self.email,
            display_name: self.name,
            role,
        })
    }
}

/// The caller's identity, `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

impl CurrentUser {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

// ============================================================================
// Identity Middleware
// ============================================================================

/// Decodes an optional bearer token into a [`CurrentUser`].
///
/// Requests without an `Authorization` header pass through anonymously; a
/// header that does not carry a valid token is rejected with 401. Operations
/// that need an identity reject anonymous callers themselves.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::AuthenticationError("Malformed Authorization header".to_string()))?
                .to_string(),
        ),
    };

    let user = match header {
        None => None,
        Some(header) => {
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::AuthenticationError("Expected a bearer token".to_string()))?;

            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(state.auth.secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                AppError::AuthenticationError("Invalid or expired token".to_string())
            })?;

            let user = token_data
                .claims
                .into_user()
                .ok_or_else(|| AppError::AuthenticationError("Token subject is not a user id".to_string()))?;
            Some(user)
        }
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.into(),
            email: "guide@magpie.test".into(),
            name: "Guide".into(),
            role: role.into(),
            exp: 0,
        }
    }

    #[test]
    fn test_admin_role_claim() {
        let id = Uuid::new_v4();
        let user = claims(&id.to_string(), "admin").into_user().unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_admin());

        let user = claims(&id.to_string(), "user").into_user().unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        assert!(claims("guest-42", "user").into_user().is_none());
    }
}
