//! Email delivery log models.
//!
//! Every delivery attempt, successful or not, appends one immutable
//! record. Rows are only ever removed when their parent survey is purged
//! by the retention cleanup.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Success,
    Error,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Success => "SUCCESS",
            DeliveryStatus::Error => "ERROR",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(DeliveryStatus::Success),
            "ERROR" => Ok(DeliveryStatus::Error),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}

/// One delivery-log record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLog {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_roundtrip() {
        assert_eq!(
            "SUCCESS".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::Success
        );
        assert_eq!(
            "ERROR".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::Error
        );
        assert!("PENDING".parse::<DeliveryStatus>().is_err());
    }
}
