//! Repository for email delivery logs.

use domain::models::{DeliveryStatus, EmailLog};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EmailLogEntity;
use crate::metrics::QueryTimer;

/// Repository for email log operations.
#[derive(Clone)]
pub struct EmailLogRepository {
    pool: PgPool,
}

impl EmailLogRepository {
    /// Creates a new email log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records one delivery attempt, successful or not.
    pub async fn insert(
        &self,
        survey_id: Option<Uuid>,
        recipient: &str,
        subject: &str,
        status: DeliveryStatus,
        error_details: Option<&str>,
    ) -> Result<EmailLog, sqlx::Error> {
        let timer = QueryTimer::new("insert_email_log");
        let entity = sqlx::query_as::<_, EmailLogEntity>(
            r#"
            INSERT INTO email_logs (survey_id, recipient, subject, status, error_details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, survey_id, recipient, subject, status, error_details, created_at
            "#,
        )
        .bind(survey_id)
        .bind(recipient)
        .bind(subject)
        .bind(status.as_str())
        .bind(error_details)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(email_log_to_domain(entity))
    }

    /// Most recent delivery attempts, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<EmailLog>, sqlx::Error> {
        let timer = QueryTimer::new("list_email_logs");
        let entities = sqlx::query_as::<_, EmailLogEntity>(
            "SELECT id, survey_id, recipient, subject, status, error_details, created_at \
             FROM email_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        Ok(entities.into_iter().map(email_log_to_domain).collect())
    }
}

fn email_log_to_domain(entity: EmailLogEntity) -> EmailLog {
    EmailLog {
        id: entity.id,
        survey_id: entity.survey_id,
        recipient: entity.recipient,
        subject: entity.subject,
        status: entity.status.parse().unwrap_or(DeliveryStatus::Error),
        error_details: entity.error_details,
        created_at: entity.created_at,
    }
}
