//! Survey and answer entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the surveys table.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyEntity {
    pub id: Uuid,
    pub template_id: Uuid,
    pub reference: Option<String>,
    pub employee: String,
    pub addressee_email: String,
    pub status: String,
    pub comment: Option<String>,
    pub average_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

/// Database row mapping for the answers table.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerEntity {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub question_id: Uuid,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}
