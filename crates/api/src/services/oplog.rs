//! Fire-and-forget application event logging.
//!
//! Writes to the backend_logs table without blocking the caller. Failures
//! are reported to tracing only; an unlogged event never fails a request.

use domain::models::{LogLevel, LogSource};
use persistence::repositories::BackendLogRepository;
use sqlx::PgPool;
use tracing::warn;

/// Records an application event asynchronously.
pub fn log(
    pool: &PgPool,
    level: LogLevel,
    source: LogSource,
    message: String,
    details: Option<serde_json::Value>,
) {
    let pool = pool.clone();
    tokio::spawn(async move {
        let repo = BackendLogRepository::new(pool);
        if let Err(e) = repo
            .insert(level, source.as_str(), &message, details.as_ref())
            .await
        {
            warn!("Failed to record application event: {}", e);
        }
    });
}
