//! Setting entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the settings table.
///
/// Settings are a flat key/value store. Values are stored as text and
/// interpreted by the domain layer.
#[derive(Debug, Clone, FromRow)]
pub struct SettingEntity {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
