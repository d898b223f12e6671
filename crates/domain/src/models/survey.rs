//! Survey lifecycle models.
//!
//! A survey is one instance of a template sent to one recipient. Its
//! status only ever moves open -> answered; submission writes the answers,
//! the average score and the status flip in one transaction.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::template::Template;

/// Survey lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Open,
    Answered,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Open => "open",
            SurveyStatus::Answered => "answered",
        }
    }
}

impl std::fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SurveyStatus::Open),
            "answered" => Ok(SurveyStatus::Answered),
            other => Err(format!("unknown survey status: {}", other)),
        }
    }
}

/// A respondent's numeric rating for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub question_id: Uuid,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// A survey with its template and any submitted answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    pub template_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub employee: String,
    pub addressee_email: String,
    pub status: SurveyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<Answer>,
}

/// Public view of an unanswered survey: just enough to render the form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub template: Template,
}

/// Request body for triggering a new survey.
///
/// The template is addressed either by id or by its unique internal name;
/// exactly one must resolve.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSurveyRequest {
    pub template_id: Option<Uuid>,
    pub template_name: Option<String>,
    pub reference: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Employee name is required"))]
    pub employee: String,
    #[validate(email(message = "A valid addressee email is required"))]
    pub addressee_email: String,
}

/// Request body for the public answer submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyRequest {
    pub answers: HashMap<Uuid, f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SubmitSurveyRequest {
    /// Arithmetic mean of the submitted values; 0 when no answers.
    ///
    /// The zero case should be unreachable since submission requires one
    /// answer per question, but is kept as a defensive default.
    pub fn average_score(&self) -> f64 {
        if self.answers.is_empty() {
            return 0.0;
        }
        self.answers.values().sum::<f64>() / self.answers.len() as f64
    }
}

/// Admin list filters; all AND-combined, absent filters are no-ops.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSurveysQuery {
    /// Substring match against the survey reference OR the addressee email.
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Substring match against the employee name.
    pub employee: Option<String>,
    /// Exact status match; "all" disables the filter.
    pub status: Option<String>,
    /// Inclusive creation-date range.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListSurveysQuery {
    /// Status filter with the "all" sentinel resolved away.
    pub fn status_filter(&self) -> Option<SurveyStatus> {
        self.status
            .as_deref()
            .filter(|s| *s != "all")
            .and_then(|s| s.parse().ok())
    }

    /// Lower bound of the creation-date range (start of day, UTC).
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    /// Upper bound of the creation-date range (end of day, UTC, inclusive).
    pub fn created_until(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }
}

/// Filters accepted by the stats endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatsQuery {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub employee: Option<String>,
}

/// Aggregated average scores per calendar period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStats {
    pub year: f64,
    pub quarter: f64,
    pub month: f64,
}

/// Start timestamps of the current calendar year, quarter and month.
pub fn stats_period_starts(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let quarter_month = ((now.month() - 1) / 3) * 3 + 1;
    (
        start_of_month(now.year(), 1),
        start_of_month(now.year(), quarter_month),
        start_of_month(now.year(), now.month()),
    )
}

fn start_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // month is always 1..=12 here, so the date is always representable
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&date)
}
