//! Invitation email content assembly.
//!
//! Subject and body come from the survey's template, with `{reference}`
//! and `{link}` tokens substituted, then the body is wrapped in a fixed
//! HTML shell (optional logo on top, disclaimer at the bottom). The
//! plain-text alternative is the body with tags stripped plus the raw
//! link, for clients that do not render HTML.

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::models::template::Template;

/// Subject pattern used when the template does not define one.
pub const DEFAULT_EMAIL_SUBJECT: &str = "Feedback Request: {reference}";

/// Body pattern used when the template does not define one.
pub const DEFAULT_EMAIL_BODY: &str =
    r#"<div><p>Please provide your feedback.</p><p><a href="{link}">Click here</a></p></div>"#;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
}

/// Fully rendered invitation content.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Builds the public survey link for the given application base URL.
pub fn survey_link(app_url: &str, survey_id: Uuid) -> String {
    format!("{}/survey/{}", app_url.trim_end_matches('/'), survey_id)
}

/// Renders the invitation for a survey.
///
/// `reference` substitutes as the empty string when absent.
pub fn render_invitation(template: &Template, reference: Option<&str>, link: &str) -> Invitation {
    let reference = reference.unwrap_or("");

    let subject = template
        .email_subject
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_EMAIL_SUBJECT)
        .replace("{reference}", reference);

    let body = template
        .email_body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(DEFAULT_EMAIL_BODY)
        .replace("{reference}", reference)
        .replace("{link}", link);

    let html_body = wrap_html_shell(&body, template.logo_url.as_deref());

    let text_body = format!(
        "{}\n\nTo participate, please visit:\n{}",
        strip_tags(&body).trim(),
        link
    );

    Invitation {
        subject,
        html_body,
        text_body,
    }
}

/// Removes HTML tags, leaving the text content.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").to_string()
}

fn wrap_html_shell(body: &str, logo_url: Option<&str>) -> String {
    let logo = match logo_url {
        Some(url) if !url.trim().is_empty() => format!(
            r#"<img src="{}" alt="Logo" style="max-height: 50px;">"#,
            url
        ),
        _ => String::new(),
    };

    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; color: #333;">
    <div style="text-align: center; margin-bottom: 20px;">{logo}</div>
    {body}
    <hr style="border: 0; border-top: 1px solid #eee; margin: 20px 0;">
    <small style="color: #666;">This is an automated message.</small>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(subject: Option<&str>, body: Option<&str>, logo: Option<&str>) -> Template {
        Template {
            id: Uuid::new_v4(),
            title: "Feedback".to_string(),
            internal_name: None,
            intro_text: None,
            logo_url: logo.map(|l| l.to_string()),
            html_design: None,
            email_subject: subject.map(|s| s.to_string()),
            email_body: body.map(|b| b.to_string()),
            comment_label: None,
            submit_button_label: None,
            thank_you_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            questions: vec![],
        }
    }

    #[test]
    fn test_survey_link() {
        let id = Uuid::nil();
        assert_eq!(
            survey_link("https://app.example.com/", id),
            format!("https://app.example.com/survey/{}", id)
        );
    }

    #[test]
    fn test_subject_reference_substitution() {
        let t = template(Some("Your order {reference}"), None, None);
        let invitation = render_invitation(&t, Some("ORD-42"), "http://x/survey/1");
        assert_eq!(invitation.subject, "Your order ORD-42");
    }

    #[test]
    fn test_missing_reference_substitutes_empty() {
        let t = template(None, None, None);
        let invitation = render_invitation(&t, None, "http://x/survey/1");
        assert_eq!(invitation.subject, "Feedback Request: ");
    }

    #[test]
    fn test_body_link_substitution_and_shell() {
        let t = template(
            None,
            Some(r#"<p>Rate {reference}: <a href="{link}">here</a></p>"#),
            None,
        );
        let link = "https://app/survey/abc";
        let invitation = render_invitation(&t, Some("R1"), link);
        assert!(invitation.html_body.contains(r#"<a href="https://app/survey/abc">here</a>"#));
        assert!(invitation.html_body.contains("Rate R1"));
        assert!(invitation.html_body.contains("This is an automated message."));
    }

    #[test]
    fn test_logo_rendered_only_when_present() {
        let with_logo = template(None, None, Some("https://cdn/logo.png"));
        let invitation = render_invitation(&with_logo, None, "http://x");
        assert!(invitation.html_body.contains(r#"src="https://cdn/logo.png""#));

        let without_logo = template(None, None, None);
        let invitation = render_invitation(&without_logo, None, "http://x");
        assert!(!invitation.html_body.contains("<img"));
    }

    #[test]
    fn test_plain_text_strips_tags_and_appends_link() {
        let t = template(None, Some("<p>Hello <b>there</b></p>"), None);
        let link = "https://app/survey/abc";
        let invitation = render_invitation(&t, None, link);
        assert!(invitation.text_body.starts_with("Hello there"));
        assert!(invitation
            .text_body
            .ends_with("To participate, please visit:\nhttps://app/survey/abc"));
        assert!(!invitation.text_body.contains('<'));
    }

    #[test]
    fn test_default_patterns_applied_when_blank() {
        let t = template(Some("   "), Some(""), None);
        let invitation = render_invitation(&t, Some("X"), "http://x/s/1");
        assert_eq!(invitation.subject, "Feedback Request: X");
        assert!(invitation.html_body.contains("Please provide your feedback."));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<div><p>a</p>b</div>"), "ab");
        assert_eq!(strip_tags("no tags"), "no tags");
    }
}
