//! API key entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the api_keys table.
///
/// The raw key is never stored. Only its SHA-256 hash and a short prefix
/// for display purposes are persisted.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyEntity {
    pub id: Uuid,
    pub key_hash: String,
    pub key_prefix: String,
    pub name: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
