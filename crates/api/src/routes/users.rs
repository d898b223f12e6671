//! Admin user management routes. All require the ADMIN role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{CreateUserRequest, LogLevel, LogSource, Role, UserResponse};
use persistence::repositories::user::user_to_response;
use persistence::repositories::UserRepository;
use shared::password::hash_password;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::session::SessionUser;
use crate::services::oplog;

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    Ok(Json(repo.list().await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    session: SessionUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;
    let role = request.role.unwrap_or(Role::User);

    let repo = UserRepository::new(state.pool.clone());
    // Unique email violations surface as 409 via the sqlx conversion
    let user = repo.create(&request.email, &password_hash, role).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Auth,
        format!("User {} created by {}", user.email, session.email),
        None,
    );

    Ok((StatusCode::CREATED, Json(user_to_response(user))))
}

/// DELETE /api/users/:id
///
/// An account cannot delete itself, and the last remaining admin cannot
/// be removed.
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if id == session.user_id {
        return Err(ApiError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }

    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.role == Role::Admin.as_str() && repo.count_admins().await? <= 1 {
        return Err(ApiError::Conflict(
            "The last admin account cannot be deleted".to_string(),
        ));
    }

    repo.delete(id).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Auth,
        format!("User {} deleted by {}", user.email, session.email),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
