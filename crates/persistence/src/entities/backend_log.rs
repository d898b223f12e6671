//! Backend log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the backend_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct BackendLogEntity {
    pub id: Uuid,
    pub level: String,
    pub source: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
