//! Repository for application event logs.
//!
//! These are operational events surfaced in the admin UI, distinct from
//! the process's tracing output.

use chrono::{DateTime, Utc};
use domain::models::{BackendLog, ListBackendLogsQuery, LogLevel};
use sqlx::PgPool;

use crate::entities::BackendLogEntity;
use crate::metrics::QueryTimer;

/// Repository for backend log operations.
#[derive(Clone)]
pub struct BackendLogRepository {
    pool: PgPool,
}

impl BackendLogRepository {
    /// Creates a new backend log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records one application event.
    pub async fn insert(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO backend_logs (level, source, message, details)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(level.as_str())
        .bind(source)
        .bind(message)
        .bind(details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Lists events matching the filters, newest first.
    pub async fn list(&self, query: &ListBackendLogsQuery) -> Result<Vec<BackendLog>, sqlx::Error> {
        let timer = QueryTimer::new("list_backend_logs");

        let mut conditions = vec!["TRUE".to_string()];
        let mut param_count = 0;

        let level = query.level_filter();
        if level.is_some() {
            param_count += 1;
            conditions.push(format!("level = ${}", param_count));
        }

        let source = query.source_filter();
        if source.is_some() {
            param_count += 1;
            conditions.push(format!("source = ${}", param_count));
        }

        let sql = format!(
            "SELECT id, level, source, message, details, created_at \
             FROM backend_logs WHERE {} ORDER BY created_at DESC LIMIT ${}",
            conditions.join(" AND "),
            param_count + 1
        );

        let mut q = sqlx::query_as::<_, BackendLogEntity>(&sql);
        if let Some(level) = level {
            q = q.bind(level.as_str());
        }
        if let Some(source) = source {
            q = q.bind(source.to_string());
        }
        let entities = q.bind(query.limit_clamped()).fetch_all(&self.pool).await?;
        timer.record();

        Ok(entities.into_iter().map(backend_log_to_domain).collect())
    }

    /// Drops events older than the cutoff. Returns the number removed.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_backend_logs");
        let result = sqlx::query("DELETE FROM backend_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

fn backend_log_to_domain(entity: BackendLogEntity) -> BackendLog {
    BackendLog {
        id: entity.id,
        level: entity.level.parse().unwrap_or(LogLevel::Info),
        source: entity.source,
        message: entity.message,
        details: entity.details,
        created_at: entity.created_at,
    }
}
