//! Log inspection routes for the admin UI.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use domain::models::{BackendLog, EmailLog, ListBackendLogsQuery};
use persistence::repositories::{BackendLogRepository, EmailLogRepository};

use crate::app::AppState;
use crate::error::ApiError;

/// Number of email delivery attempts returned by the log endpoint.
const EMAIL_LOG_LIMIT: i64 = 100;

/// GET /api/logs/email
pub async fn list_email_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmailLog>>, ApiError> {
    let repo = EmailLogRepository::new(state.pool.clone());
    Ok(Json(repo.list_recent(EMAIL_LOG_LIMIT).await?))
}

/// GET /api/logs/backend
pub async fn list_backend_logs(
    State(state): State<AppState>,
    Query(query): Query<ListBackendLogsQuery>,
) -> Result<Json<Vec<BackendLog>>, ApiError> {
    let repo = BackendLogRepository::new(state.pool.clone());
    Ok(Json(repo.list(&query).await?))
}

/// DELETE /api/logs/backend
///
/// Drops application events older than the configured retention window.
pub async fn prune_backend_logs(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let retention_days = state.config.cleanup.log_retention_days;
    let cutoff = Utc::now() - Duration::days(retention_days as i64);

    let repo = BackendLogRepository::new(state.pool.clone());
    let deleted = repo.delete_older_than(cutoff).await?;

    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
