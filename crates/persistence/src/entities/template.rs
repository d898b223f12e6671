//! Template and question entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the templates table.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateEntity {
    pub id: Uuid,
    pub title: String,
    pub internal_name: Option<String>,
    pub intro_text: Option<String>,
    pub logo_url: Option<String>,
    pub html_design: Option<String>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub comment_label: Option<String>,
    pub submit_button_label: Option<String>,
    pub thank_you_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row mapping for the questions table.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionEntity {
    pub id: Uuid,
    pub template_id: Uuid,
    pub text: String,
    pub position: i32,
}
