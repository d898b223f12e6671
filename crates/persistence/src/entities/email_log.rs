//! Email log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the email_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailLogEntity {
    pub id: Uuid,
    pub survey_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub status: String,
    pub error_details: Option<String>,
    pub created_at: DateTime<Utc>,
}
