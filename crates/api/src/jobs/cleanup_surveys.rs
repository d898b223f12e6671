//! Survey retention cleanup job.
//!
//! Deletes surveys past the configured retention window, together with
//! their answers and email logs (cascade). Retention settings are read
//! fresh on every run so admin changes apply without a restart.

use chrono::{Duration, Utc};
use domain::models::settings::CleanupSettings;
use domain::models::{LogLevel, LogSource};
use persistence::repositories::{BackendLogRepository, SettingRepository, SurveyRepository};
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};
use crate::services::oplog;

/// Background job enforcing survey and event log retention.
pub struct CleanupSurveysJob {
    pool: PgPool,
    interval_minutes: u64,
    log_retention_days: u32,
}

impl CleanupSurveysJob {
    /// Creates a new cleanup job.
    pub fn new(pool: PgPool, interval_minutes: u64, log_retention_days: u32) -> Self {
        Self {
            pool,
            interval_minutes,
            log_retention_days,
        }
    }

    async fn run(&self) -> Result<(), sqlx::Error> {
        let settings = SettingRepository::new(self.pool.clone()).get_all().await?;
        let cleanup = CleanupSettings::from_map(&settings);

        if !cleanup.enabled {
            debug!("Survey cleanup disabled in settings, skipping run");
            return Ok(());
        }

        let cutoff = Utc::now() - Duration::days(cleanup.retention_days as i64);
        let deleted = SurveyRepository::new(self.pool.clone())
            .delete_created_before(cutoff)
            .await?;

        if deleted > 0 {
            info!(
                deleted = deleted,
                retention_days = cleanup.retention_days,
                "Removed surveys past retention"
            );
            oplog::log(
                &self.pool,
                LogLevel::Info,
                LogSource::Cleanup,
                format!("Removed {} surveys past retention", deleted),
                Some(serde_json::json!({
                    "deleted": deleted,
                    "retentionDays": cleanup.retention_days,
                })),
            );
        }

        let log_cutoff = Utc::now() - Duration::days(self.log_retention_days as i64);
        let logs_deleted = BackendLogRepository::new(self.pool.clone())
            .delete_older_than(log_cutoff)
            .await?;
        if logs_deleted > 0 {
            debug!(deleted = logs_deleted, "Pruned old application event logs");
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Job for CleanupSurveysJob {
    fn name(&self) -> &'static str {
        "cleanup_surveys"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        self.run().await.map_err(|e| e.to_string())
    }
}
