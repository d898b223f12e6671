//! Application settings routes.
//!
//! Settings are edited as one key/value map from the admin screen. SMTP
//! credentials live here rather than in the process environment so they
//! can be rotated at runtime.

use std::collections::HashMap;

use axum::{extract::State, Json};
use domain::models::{LogLevel, LogSource};
use persistence::repositories::SettingRepository;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::email::EmailError;
use crate::services::oplog;

/// GET /api/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let repo = SettingRepository::new(state.pool.clone());
    Ok(Json(repo.get_all().await?))
}

/// POST /api/settings
///
/// Upserts the submitted keys and returns the full updated map. Keys not
/// present in the body keep their current values.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(entries): Json<HashMap<String, String>>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let repo = SettingRepository::new(state.pool.clone());
    repo.upsert_many(&entries).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Settings,
        format!("Settings updated ({} keys)", entries.len()),
        Some(serde_json::json!({
            "keys": entries.keys().collect::<Vec<_>>(),
        })),
    );

    Ok(Json(repo.get_all().await?))
}

/// Request body for the SMTP test endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailRequest {
    #[validate(email(message = "A valid recipient email is required"))]
    pub recipient: String,
}

/// POST /api/settings/test-email
///
/// Sends a test message with the currently stored SMTP settings.
pub async fn send_test_email(
    State(state): State<AppState>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    request.validate()?;

    let settings = SettingRepository::new(state.pool.clone()).get_all().await?;
    state
        .email
        .send_test(&request.recipient, &settings)
        .await
        .map_err(|e| match e {
            EmailError::NotConfigured => {
                ApiError::Configuration("SMTP is not configured".to_string())
            }
            other => ApiError::EmailDelivery(other.to_string()),
        })?;

    Ok(Json(serde_json::json!({ "sent": true })))
}
