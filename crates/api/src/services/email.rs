//! Email dispatch over SMTP.
//!
//! The SMTP connection parameters live in the settings table so admins can
//! change them at runtime. A fresh transport is built per send from the
//! current settings, and every delivery attempt is recorded in email_logs.

use std::collections::HashMap;
use std::time::Duration;

use domain::models::settings::{app_url, SmtpSettings};
use domain::models::{DeliveryStatus, LogLevel, LogSource, Survey, Template};
use domain::services::invitation::{render_invitation, survey_link, Invitation};
use lettre::message::header::{Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::middleware::metrics::record_email_sent;
use crate::services::oplog;

const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors that can occur during email dispatch.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP is not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Email service for survey invitations and test messages.
#[derive(Clone)]
pub struct EmailService {
    pool: PgPool,
}

impl EmailService {
    /// Creates a new email service.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Renders and sends the invitation email for a survey.
    ///
    /// The attempt is recorded in email_logs either way; on failure the
    /// error detail is stored with the log entry.
    pub async fn send_invitation(
        &self,
        survey: &Survey,
        template: &Template,
        settings: &HashMap<String, String>,
    ) -> Result<(), EmailError> {
        let link = survey_link(&app_url(settings), survey.id);
        let invitation = render_invitation(template, survey.reference.as_deref(), &link);

        self.dispatch(
            Some(survey.id),
            &survey.addressee_email,
            &invitation,
            settings,
        )
        .await
    }

    /// Sends a short test message to verify the SMTP configuration.
    pub async fn send_test(
        &self,
        recipient: &str,
        settings: &HashMap<String, String>,
    ) -> Result<(), EmailError> {
        let invitation = Invitation {
            subject: "SMTP configuration test".to_string(),
            html_body: "<p>This is a test message. Your SMTP settings are working.</p>"
                .to_string(),
            text_body: "This is a test message. Your SMTP settings are working.".to_string(),
        };

        self.dispatch(None, recipient, &invitation, settings).await
    }

    async fn dispatch(
        &self,
        survey_id: Option<Uuid>,
        recipient: &str,
        invitation: &Invitation,
        settings: &HashMap<String, String>,
    ) -> Result<(), EmailError> {
        let smtp = SmtpSettings::from_map(settings);

        // A configuration failure counts as a failed delivery attempt and
        // gets a delivery-log record like any transport error.
        let result = if smtp.is_configured() {
            send_over_smtp(&smtp, recipient, invitation).await
        } else {
            Err(EmailError::NotConfigured)
        };
        self.log_attempt(survey_id, recipient, &invitation.subject, &result)
            .await;
        result
    }

    async fn log_attempt(
        &self,
        survey_id: Option<Uuid>,
        recipient: &str,
        subject: &str,
        result: &Result<(), EmailError>,
    ) {
        let (status, detail) = match result {
            Ok(()) => {
                info!(recipient = %recipient, subject = %subject, "Email sent");
                record_email_sent(true);
                (DeliveryStatus::Success, None)
            }
            Err(e) => {
                error!(recipient = %recipient, subject = %subject, error = %e, "Email delivery failed");
                record_email_sent(false);
                (DeliveryStatus::Error, Some(e.to_string()))
            }
        };

        let repo = persistence::repositories::EmailLogRepository::new(self.pool.clone());
        if let Err(e) = repo
            .insert(survey_id, recipient, subject, status, detail.as_deref())
            .await
        {
            error!("Failed to record email log entry: {}", e);
        }

        if status == DeliveryStatus::Error {
            oplog::log(
                &self.pool,
                LogLevel::Error,
                LogSource::Email,
                format!("Email delivery to {} failed", recipient),
                detail.map(|d| serde_json::json!({ "error": d })),
            );
        }
    }
}

async fn send_over_smtp(
    smtp: &SmtpSettings,
    recipient: &str,
    invitation: &Invitation,
) -> Result<(), EmailError> {
    let message = build_message(smtp, recipient, invitation)?;
    let transport = build_transport(smtp)?;

    // Verify connectivity and credentials first so auth problems surface
    // as a clear error instead of a mid-send failure.
    match transport.test_connection().await {
        Ok(true) => {}
        Ok(false) => {
            return Err(EmailError::SendFailed(
                "SMTP connection test failed".to_string(),
            ))
        }
        Err(e) => return Err(EmailError::SendFailed(e.to_string())),
    }

    transport
        .send(message)
        .await
        .map_err(|e| EmailError::SendFailed(e.to_string()))?;
    Ok(())
}

/// `List-Unsubscribe` header pointing at the sender mailbox. Recipients
/// did not opt in to a mailing list; this gives their client a standard
/// way to signal "stop".
#[derive(Debug, Clone)]
struct ListUnsubscribe(String);

impl ListUnsubscribe {
    fn mailto(sender: &str) -> Self {
        Self(format!("<mailto:{}?subject=unsubscribe>", sender))
    }
}

impl Header for ListUnsubscribe {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("List-Unsubscribe")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

fn build_message(
    smtp: &SmtpSettings,
    recipient: &str,
    invitation: &Invitation,
) -> Result<Message, EmailError> {
    let sender: Address = smtp
        .username
        .parse()
        .map_err(|_| EmailError::InvalidAddress(smtp.username.clone()))?;
    let to: Address = recipient
        .parse()
        .map_err(|_| EmailError::InvalidAddress(recipient.to_string()))?;

    Message::builder()
        .from(Mailbox::new(Some(smtp.sender_display()), sender))
        .to(Mailbox::new(None, to))
        .subject(invitation.subject.clone())
        .date_now()
        .header(ListUnsubscribe::mailto(&smtp.username))
        .multipart(MultiPart::alternative_plain_html(
            invitation.text_body.clone(),
            invitation.html_body.clone(),
        ))
        .map_err(|e| EmailError::SendFailed(e.to_string()))
}

fn build_transport(
    smtp: &SmtpSettings,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let tls_params = TlsParameters::builder(smtp.host.clone())
        .dangerous_accept_invalid_certs(!smtp.tls_reject)
        .build()
        .map_err(|e| EmailError::SendFailed(e.to_string()))?;

    // secure=true means implicit TLS (usually port 465), otherwise STARTTLS
    // is used when the server offers it.
    let tls = if smtp.secure {
        Tls::Wrapper(tls_params)
    } else {
        Tls::Opportunistic(tls_params)
    };

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp.host.as_str())
        .port(smtp.port)
        .tls(tls)
        .timeout(Some(SMTP_TIMEOUT));

    if !smtp.username.is_empty() {
        builder = builder.credentials(Credentials::new(
            smtp.username.clone(),
            smtp.password.clone(),
        ));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_settings() -> SmtpSettings {
        let mut map = HashMap::new();
        map.insert("host".to_string(), "smtp.example.com".to_string());
        map.insert("port".to_string(), "587".to_string());
        map.insert("user".to_string(), "surveys@example.com".to_string());
        map.insert("pass".to_string(), "hunter2".to_string());
        SmtpSettings::from_map(&map)
    }

    #[test]
    fn test_build_message_multipart() {
        let invitation = Invitation {
            subject: "Feedback Request: INV-1".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            text_body: "Hello".to_string(),
        };
        let message = build_message(&smtp_settings(), "user@example.com", &invitation).unwrap();
        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("Feedback Request: INV-1"));
        assert!(rendered.contains("multipart/alternative"));
        assert!(rendered.contains("List-Unsubscribe: <mailto:surveys@example.com?subject=unsubscribe>"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let invitation = Invitation {
            subject: "s".to_string(),
            html_body: "<p>h</p>".to_string(),
            text_body: "h".to_string(),
        };
        let result = build_message(&smtp_settings(), "not-an-address", &invitation);
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[test]
    fn test_build_transport_from_settings() {
        assert!(build_transport(&smtp_settings()).is_ok());
    }

    #[test]
    fn test_unconfigured_settings_detected() {
        let smtp = SmtpSettings::from_map(&HashMap::new());
        assert!(!smtp.is_configured());
    }
}
