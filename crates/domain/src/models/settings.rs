//! Typed application settings.
//!
//! The settings store is a flat key-value table edited by administrators.
//! These types parse that map into explicit structs with defaults, so the
//! email dispatcher and the cleanup job never read loose strings.

use std::collections::HashMap;

use serde::Serialize;

/// Settings keys consumed by the core components.
pub mod keys {
    pub const APP_URL: &str = "app_url";
    pub const SMTP_HOST: &str = "host";
    pub const SMTP_PORT: &str = "port";
    pub const SMTP_USER: &str = "user";
    pub const SMTP_PASS: &str = "pass";
    pub const SMTP_SECURE: &str = "secure";
    pub const SMTP_TLS_REJECT: &str = "tls_reject";
    pub const SENDER_NAME: &str = "sender_name";
    pub const CLEANUP_ENABLED: &str = "cleanup_enabled";
    pub const CLEANUP_RETENTION_DAYS: &str = "cleanup_retention_days";
}

/// Base URL used to build public survey links.
pub const DEFAULT_APP_URL: &str = "http://localhost:5174";

/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default survey retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// SMTP delivery settings read from the settings store.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Implicit TLS (SMTPS) when true; STARTTLS negotiation otherwise.
    pub secure: bool,
    /// Verify the server certificate. Disabled only for self-signed setups.
    pub tls_reject: bool,
    pub sender_name: Option<String>,
}

impl SmtpSettings {
    /// Parses SMTP settings out of the raw key-value map.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Self {
            host: string_value(map, keys::SMTP_HOST),
            port: map
                .get(keys::SMTP_PORT)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: string_value(map, keys::SMTP_USER),
            password: string_value(map, keys::SMTP_PASS),
            secure: map.get(keys::SMTP_SECURE).map(|v| v == "true").unwrap_or(false),
            // verification stays on unless explicitly switched off
            tls_reject: map
                .get(keys::SMTP_TLS_REJECT)
                .map(|v| v != "false")
                .unwrap_or(true),
            sender_name: map
                .get(keys::SENDER_NAME)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Host and username are the minimum needed to attempt delivery.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty()
    }

    /// Display name for the From header: the configured sender name, or
    /// the local part of the SMTP username.
    pub fn sender_display(&self) -> String {
        match &self.sender_name {
            Some(name) => name.clone(),
            None => self
                .username
                .split('@')
                .next()
                .unwrap_or(&self.username)
                .to_string(),
        }
    }
}

/// Retention-cleanup settings read from the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSettings {
    pub enabled: bool,
    pub retention_days: u32,
}

impl CleanupSettings {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Self {
            enabled: map
                .get(keys::CLEANUP_ENABLED)
                .map(|v| v != "false")
                .unwrap_or(true),
            retention_days: map
                .get(keys::CLEANUP_RETENTION_DAYS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETENTION_DAYS),
        }
    }
}

/// Application base URL for public survey links, with fallback.
pub fn app_url(map: &HashMap<String, String>) -> String {
    map.get(keys::APP_URL)
        .map(|v| v.trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
}

fn string_value(map: &HashMap<String, String>, key: &str) -> String {
    map.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_smtp_settings_defaults() {
        let settings = SmtpSettings::from_map(&HashMap::new());
        assert_eq!(settings.port, DEFAULT_SMTP_PORT);
        assert!(!settings.secure);
        assert!(settings.tls_reject);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_smtp_settings_parse() {
        let settings = SmtpSettings::from_map(&map(&[
            ("host", "smtp.example.com"),
            ("port", "465"),
            ("user", "noreply@example.com"),
            ("pass", "secret"),
            ("secure", "true"),
            ("tls_reject", "false"),
            ("sender_name", "Feedback Team"),
        ]));
        assert_eq!(settings.host, "smtp.example.com");
        assert_eq!(settings.port, 465);
        assert!(settings.secure);
        assert!(!settings.tls_reject);
        assert!(settings.is_configured());
        assert_eq!(settings.sender_display(), "Feedback Team");
    }

    #[test]
    fn test_smtp_settings_invalid_port_falls_back() {
        let settings = SmtpSettings::from_map(&map(&[("port", "not-a-port")]));
        assert_eq!(settings.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_sender_display_from_local_part() {
        let settings = SmtpSettings::from_map(&map(&[
            ("host", "smtp.example.com"),
            ("user", "noreply@example.com"),
        ]));
        assert_eq!(settings.sender_display(), "noreply");
    }

    #[test]
    fn test_missing_host_or_user_not_configured() {
        let settings = SmtpSettings::from_map(&map(&[("host", "smtp.example.com")]));
        assert!(!settings.is_configured());
        let settings = SmtpSettings::from_map(&map(&[("user", "x@y.z")]));
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_cleanup_settings_defaults() {
        let settings = CleanupSettings::from_map(&HashMap::new());
        assert!(settings.enabled);
        assert_eq!(settings.retention_days, 30);
    }

    #[test]
    fn test_cleanup_settings_disabled() {
        let settings = CleanupSettings::from_map(&map(&[("cleanup_enabled", "false")]));
        assert!(!settings.enabled);
    }

    #[test]
    fn test_cleanup_settings_custom_retention() {
        let settings = CleanupSettings::from_map(&map(&[("cleanup_retention_days", "90")]));
        assert_eq!(settings.retention_days, 90);
    }

    #[test]
    fn test_cleanup_settings_garbage_retention_falls_back() {
        let settings = CleanupSettings::from_map(&map(&[("cleanup_retention_days", "soon")]));
        assert_eq!(settings.retention_days, 30);
    }

    #[test]
    fn test_app_url_fallback_and_trailing_slash() {
        assert_eq!(app_url(&HashMap::new()), DEFAULT_APP_URL);
        assert_eq!(
            app_url(&map(&[("app_url", "https://feedback.example.com/")])),
            "https://feedback.example.com"
        );
    }
}
