//! Repository for application settings.
//!
//! Settings are a flat key/value table edited as a whole from the admin
//! screen, so reads return the full map and writes upsert in bulk.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::entities::SettingEntity;
use crate::metrics::QueryTimer;

/// Repository for settings operations.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    /// Creates a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads all settings as a key/value map.
    pub async fn get_all(&self) -> Result<HashMap<String, String>, sqlx::Error> {
        let timer = QueryTimer::new("get_all_settings");
        let rows = sqlx::query_as::<_, SettingEntity>(
            "SELECT key, value, updated_at FROM settings",
        )
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    /// Loads a single setting value.
    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("get_setting");
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        timer.record();
        Ok(value)
    }

    /// Upserts the given key/value pairs in one transaction.
    pub async fn upsert_many(&self, entries: &HashMap<String, String>) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_settings");
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value)
                VALUES ($1, $2)
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(())
    }
}
