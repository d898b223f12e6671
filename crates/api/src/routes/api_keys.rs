//! API key management routes.
//!
//! Keys authenticate machine callers of the survey trigger endpoints.
//! The raw key is shown exactly once at creation; only its SHA-256 hash
//! is stored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    ApiKeySummary, CreateApiKeyRequest, CreateApiKeyResponse, LogLevel, LogSource,
};
use persistence::repositories::ApiKeyRepository;
use shared::crypto::{extract_key_prefix, generate_api_key, sha256_hex};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::oplog;

/// GET /api/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApiKeySummary>>, ApiError> {
    let repo = ApiKeyRepository::new(state.pool.clone());
    Ok(Json(repo.list().await?))
}

/// POST /api/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreateApiKeyResponse>), ApiError> {
    request.validate()?;

    let raw_key = generate_api_key();
    let key_hash = sha256_hex(&raw_key);
    // Generated keys are always long enough to carry a display prefix
    let key_prefix = extract_key_prefix(&raw_key)
        .ok_or_else(|| ApiError::Internal("Generated key has no prefix".to_string()))?;

    let repo = ApiKeyRepository::new(state.pool.clone());
    let entity = repo.create(&request.name, &key_hash, key_prefix).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::ApiKeys,
        format!("API key \"{}\" created", entity.name),
        None,
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            id: entity.id,
            name: entity.name,
            raw_key,
            created_at: entity.created_at,
        }),
    ))
}

/// DELETE /api/api-keys/:id
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = ApiKeyRepository::new(state.pool.clone());
    if !repo.delete(id).await? {
        return Err(ApiError::NotFound("API key not found".to_string()));
    }

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::ApiKeys,
        format!("API key {} revoked", id),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
