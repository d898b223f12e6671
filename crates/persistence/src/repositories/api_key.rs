//! Repository for API key database operations.

use domain::models::ApiKeySummary;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ApiKeyEntity;
use crate::metrics::QueryTimer;

/// Repository for API key operations.
#[derive(Clone)]
pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    /// Creates a new API key repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a newly generated key's hash and display prefix.
    pub async fn create(
        &self,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<ApiKeyEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_api_key");
        let entity = sqlx::query_as::<_, ApiKeyEntity>(
            r#"
            INSERT INTO api_keys (name, key_hash, key_prefix)
            VALUES ($1, $2, $3)
            RETURNING id, key_hash, key_prefix, name, last_used_at, created_at
            "#,
        )
        .bind(name)
        .bind(key_hash)
        .bind(key_prefix)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(entity)
    }

    /// Lists all keys, newest first. The hash never leaves this layer.
    pub async fn list(&self) -> Result<Vec<ApiKeySummary>, sqlx::Error> {
        let timer = QueryTimer::new("list_api_keys");
        let entities = sqlx::query_as::<_, ApiKeyEntity>(
            "SELECT id, key_hash, key_prefix, name, last_used_at, created_at \
             FROM api_keys ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        Ok(entities
            .into_iter()
            .map(|e| ApiKeySummary {
                id: e.id,
                name: e.name,
                last_used_at: e.last_used_at,
                created_at: e.created_at,
            })
            .collect())
    }

    /// Finds an API key by its hash.
    pub async fn find_by_key_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_api_key_by_hash");
        let result = sqlx::query_as::<_, ApiKeyEntity>(
            "SELECT id, key_hash, key_prefix, name, last_used_at, created_at \
             FROM api_keys WHERE key_hash = $1",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();
        Ok(result)
    }

    /// Updates the last_used_at timestamp. Called fire-and-forget after a
    /// successful authentication, so latency never blocks the request.
    pub async fn update_last_used(&self, key_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(key_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Revokes a key by deleting it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_api_key");
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
