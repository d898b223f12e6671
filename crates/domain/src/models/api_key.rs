//! API key models for machine-to-machine survey triggering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// API key metadata as listed to administrators. The secret is never
/// included; only its hash is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an API key.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

/// Response at creation time: the raw key is returned exactly once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub raw_key: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_name() {
        let request = CreateApiKeyRequest {
            name: String::new(),
        };
        assert!(request.validate().is_err());

        let request = CreateApiKeyRequest {
            name: "CI integration".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_summary_serializes_without_secret() {
        let summary = ApiKeySummary {
            id: Uuid::new_v4(),
            name: "shop".to_string(),
            last_used_at: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"name\":\"shop\""));
        assert!(!json.contains("hash"));
        assert!(!json.contains("lastUsedAt"));
    }
}
