//! Survey template models.
//!
//! A template is a reusable survey definition: wording, styling and an
//! ordered question set. Surveys reference a template fixed at creation
//! time, so the question set becomes immutable once answers exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single rating question belonging to a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub template_id: Uuid,
    pub text: String,
    pub position: i32,
}

/// A survey template with its ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_design: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_button_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thank_you_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

/// Default title applied when a template is created without one.
pub const DEFAULT_TEMPLATE_TITLE: &str = "Feedback Request";

/// Request body for creating a template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub title: Option<String>,
    pub internal_name: Option<String>,
    pub intro_text: Option<String>,
    pub logo_url: Option<String>,
    pub html_design: Option<String>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub comment_label: Option<String>,
    pub submit_button_label: Option<String>,
    pub thank_you_message: Option<String>,
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<String>,
}

/// Request body for updating a template.
///
/// When the template already has answers, only display fields may change;
/// the question set must match the existing one after normalization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub internal_name: Option<String>,
    pub intro_text: Option<String>,
    pub logo_url: Option<String>,
    pub html_design: Option<String>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub comment_label: Option<String>,
    pub submit_button_label: Option<String>,
    pub thank_you_message: Option<String>,
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<String>,
}

/// Normalizes a question set for immutability comparison: trimmed texts,
/// sorted so that ordering differences do not count as changes.
pub fn normalize_question_set(texts: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = texts.iter().map(|t| t.trim().to_string()).collect();
    normalized.sort();
    normalized
}

/// Whether two question sets are equal after normalization.
pub fn question_sets_match(existing: &[String], proposed: &[String]) -> bool {
    normalize_question_set(existing) == normalize_question_set(proposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_question_sets_match_reordered() {
        let a = strings(&["How was the delivery?", "How was the product?"]);
        let b = strings(&["How was the product?", "How was the delivery?"]);
        assert!(question_sets_match(&a, &b));
    }

    #[test]
    fn test_question_sets_match_whitespace() {
        let a = strings(&["How was it?"]);
        let b = strings(&["  How was it?  "]);
        assert!(question_sets_match(&a, &b));
    }

    #[test]
    fn test_question_sets_differ_on_text() {
        let a = strings(&["How was it?"]);
        let b = strings(&["How was it really?"]);
        assert!(!question_sets_match(&a, &b));
    }

    #[test]
    fn test_question_sets_differ_on_count() {
        let a = strings(&["Q1", "Q2"]);
        let b = strings(&["Q1"]);
        assert!(!question_sets_match(&a, &b));
    }

    #[test]
    fn test_create_request_requires_questions() {
        let request = CreateTemplateRequest {
            title: None,
            internal_name: None,
            intro_text: None,
            logo_url: None,
            html_design: None,
            email_subject: None,
            email_body: None,
            comment_label: None,
            submit_button_label: None,
            thank_you_message: None,
            questions: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_deserializes_camel_case() {
        let json = r#"{
            "title": "NPS",
            "internalName": "nps-default",
            "questions": ["How likely are you to recommend us?"]
        }"#;
        let request: CreateTemplateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.internal_name.as_deref(), Some("nps-default"));
        assert!(request.validate().is_ok());
    }
}
