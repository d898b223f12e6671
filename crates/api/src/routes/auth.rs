//! Authentication routes.

use axum::{extract::State, Json};
use domain::models::{LoginRequest, LoginResponse, LogLevel, LogSource};
use persistence::repositories::user::user_to_response;
use persistence::repositories::UserRepository;
use shared::password::verify_password;
use tracing::warn;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::session::SessionUser;
use crate::services::oplog;

/// POST /api/auth/login
///
/// Exchanges credentials for a session token. Responds identically for an
/// unknown email and a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(state.pool.clone());
    let user = repo.find_by_email(&request.email).await?;

    let Some(user) = user else {
        return Err(invalid_credentials(&state, &request.email));
    };

    let password_ok = verify_password(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;
    if !password_ok {
        return Err(invalid_credentials(&state, &request.email));
    }

    let token = state
        .jwt
        .generate_token(user.id, &user.email, &user.role)
        .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user: user_to_response(user),
    }))
}

/// GET /api/auth/me
///
/// Returns the account behind the current session token.
pub async fn me(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<domain::models::UserResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(user_to_response(user)))
}

fn invalid_credentials(state: &AppState, email: &str) -> ApiError {
    warn!(email = %email, "Failed login attempt");
    oplog::log(
        &state.pool,
        LogLevel::Warn,
        LogSource::Auth,
        format!("Failed login attempt for {}", email),
        None,
    );
    ApiError::Unauthorized("Invalid email or password".to_string())
}
