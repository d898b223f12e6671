//! Session token extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::Role;
use shared::jwt::{JwtConfig, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated admin user behind a session token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl SessionUser {
    /// Decodes and validates a bearer token into a session user.
    pub fn from_token(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.validate_token(token)?;
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::DecodingError("invalid subject claim".to_string()))?;
        let role = claims.role.parse().unwrap_or(Role::User);

        Ok(SessionUser {
            user_id,
            email: claims.email,
            role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware stores the user when the route is behind auth; fall
        // back to decoding the header for routes that are not.
        if let Some(user) = parts.extensions.get::<SessionUser>() {
            return Ok(user.clone());
        }

        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

        Self::from_token(&state.jwt, token).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_roundtrip() {
        let jwt = JwtConfig::new("test-secret", 3600);
        let user_id = Uuid::new_v4();
        let token = jwt
            .generate_token(user_id, "admin@example.com", "ADMIN")
            .unwrap();

        let user = SessionUser::from_token(&jwt, &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "admin@example.com");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_from_token_unknown_role_downgrades() {
        let jwt = JwtConfig::new("test-secret", 3600);
        let token = jwt
            .generate_token(Uuid::new_v4(), "user@example.com", "SUPERUSER")
            .unwrap();

        let user = SessionUser::from_token(&jwt, &token).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_from_token_rejects_garbage() {
        let jwt = JwtConfig::new("test-secret", 3600);
        assert!(SessionUser::from_token(&jwt, "not-a-token").is_err());
    }
}
