//! Operational log models.
//!
//! Beside tracing output, notable events land in a database table so
//! administrators can inspect them from the dashboard without shell
//! access. Writes are best-effort and never block a request.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of an operational log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Component that produced an operational log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSource {
    Surveys,
    Email,
    Auth,
    Templates,
    Settings,
    ApiKeys,
    Cleanup,
    System,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Surveys => "surveys",
            LogSource::Email => "email",
            LogSource::Auth => "auth",
            LogSource::Templates => "templates",
            LogSource::Settings => "settings",
            LogSource::ApiKeys => "api-keys",
            LogSource::Cleanup => "cleanup",
            LogSource::System => "system",
        }
    }
}

impl std::fmt::Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operational log entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendLog {
    pub id: Uuid,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing operational logs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBackendLogsQuery {
    /// Level filter; "all" disables it.
    pub level: Option<String>,
    /// Source filter; "all" disables it.
    pub source: Option<String>,
    pub limit: Option<i64>,
}

/// Hard cap on rows returned by the log listing.
pub const MAX_LOG_LIMIT: i64 = 500;

/// Default number of rows returned by the log listing.
pub const DEFAULT_LOG_LIMIT: i64 = 100;

impl ListBackendLogsQuery {
    pub fn level_filter(&self) -> Option<LogLevel> {
        self.level
            .as_deref()
            .filter(|l| *l != "all")
            .and_then(|l| l.parse().ok())
    }

    pub fn source_filter(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| *s != "all")
    }

    pub fn limit_clamped(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse_case_insensitive() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("trace".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_query_filters_all_sentinel() {
        let query = ListBackendLogsQuery {
            level: Some("all".to_string()),
            source: Some("all".to_string()),
            limit: None,
        };
        assert!(query.level_filter().is_none());
        assert!(query.source_filter().is_none());
    }

    #[test]
    fn test_limit_clamped() {
        let query = ListBackendLogsQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.limit_clamped(), MAX_LOG_LIMIT);

        let query = ListBackendLogsQuery::default();
        assert_eq!(query.limit_clamped(), DEFAULT_LOG_LIMIT);

        let query = ListBackendLogsQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.limit_clamped(), 1);
    }

    #[test]
    fn test_source_as_str() {
        assert_eq!(LogSource::ApiKeys.as_str(), "api-keys");
        assert_eq!(LogSource::Cleanup.to_string(), "cleanup");
    }
}
