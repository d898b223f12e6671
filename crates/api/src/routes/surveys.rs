//! Survey lifecycle routes.
//!
//! Triggering is authenticated (session or API key) and retriggering
//! requires a session. The public read and submit endpoints are
//! unauthenticated; knowing the survey UUID is the capability.

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    ListSurveysQuery, LogLevel, LogSource, PublicSurvey, SubmitSurveyRequest, Survey, SurveyStats,
    SurveyStatsQuery, SurveyStatus, Template, TriggerSurveyRequest,
};
use persistence::repositories::{SettingRepository, SurveyRepository, TemplateRepository};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_survey_submitted, record_survey_triggered};
use crate::services::email::EmailError;
use crate::services::oplog;

/// POST /api/surveys
///
/// Creates a survey from a template and emails the invitation. The
/// template is addressed by id or by internal name.
pub async fn trigger_survey(
    State(state): State<AppState>,
    Json(request): Json<TriggerSurveyRequest>,
) -> Result<(StatusCode, Json<Survey>), ApiError> {
    request.validate()?;

    let template = resolve_template(&state, &request).await?;
    let repo = SurveyRepository::new(state.pool.clone());
    let mut survey = repo
        .insert(
            template.id,
            request.reference.as_deref(),
            &request.employee,
            &request.addressee_email,
        )
        .await?;

    // The survey exists either way; a failed delivery is recorded in the
    // email log and can be retried via retrigger.
    if let Err(e) = deliver_invitation(&state, &survey, &template).await {
        tracing::warn!(survey_id = %survey.id, error = %e, "Invitation delivery failed");
    }
    record_survey_triggered();

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Surveys,
        format!("Survey triggered for {}", survey.addressee_email),
        Some(serde_json::json!({
            "surveyId": survey.id,
            "templateId": template.id,
            "reference": survey.reference,
        })),
    );

    survey.template = Some(template);
    Ok((StatusCode::CREATED, Json(survey)))
}

/// POST /api/surveys/:id/retrigger
///
/// Resends the invitation for a survey that is still open.
pub async fn retrigger_survey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let survey = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?;

    if survey.status == SurveyStatus::Answered {
        return Err(ApiError::Conflict(
            "Survey has already been answered".to_string(),
        ));
    }

    let template = survey
        .template
        .clone()
        .ok_or_else(|| ApiError::Internal("Survey template is missing".to_string()))?;

    deliver_invitation(&state, &survey, &template).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Surveys,
        format!("Survey invitation resent to {}", survey.addressee_email),
        Some(serde_json::json!({ "surveyId": survey.id })),
    );

    Ok(Json(survey))
}

/// GET /api/surveys/:id/public
///
/// Returns the survey form for a recipient. Answered surveys are gone
/// for good; the link is single-use.
pub async fn get_public_survey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicSurvey>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let survey = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?;

    if survey.status == SurveyStatus::Answered {
        return Err(ApiError::Conflict(
            "Survey has already been answered".to_string(),
        ));
    }

    let template = survey
        .template
        .ok_or_else(|| ApiError::Internal("Survey template is missing".to_string()))?;

    Ok(Json(PublicSurvey {
        id: survey.id,
        reference: survey.reference,
        template,
    }))
}

/// POST /api/surveys/:id/submit
///
/// Records the answers, average score and comment in one transaction and
/// closes the survey.
pub async fn submit_survey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitSurveyRequest>,
) -> Result<Json<Survey>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let survey = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?;

    if survey.status == SurveyStatus::Answered {
        return Err(ApiError::Conflict(
            "Survey has already been answered".to_string(),
        ));
    }

    let template = survey
        .template
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Survey template is missing".to_string()))?;
    validate_answers(&request, template)?;

    let average = request.average_score();
    let updated = repo
        .submit(id, &request.answers, request.comment.as_deref(), average)
        .await?
        // A concurrent submission won the race between our status check
        // and the guarded update.
        .ok_or_else(|| {
            ApiError::Conflict("Survey has already been answered".to_string())
        })?;

    record_survey_submitted();
    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Surveys,
        format!("Survey {} answered", id),
        Some(serde_json::json!({ "averageScore": average })),
    );

    Ok(Json(updated))
}

/// GET /api/surveys
pub async fn list_surveys(
    State(state): State<AppState>,
    Query(query): Query<ListSurveysQuery>,
) -> Result<Json<Vec<Survey>>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    Ok(Json(repo.list(&query).await?))
}

/// GET /api/surveys/stats
pub async fn survey_stats(
    State(state): State<AppState>,
    Query(query): Query<SurveyStatsQuery>,
) -> Result<Json<SurveyStats>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    Ok(Json(repo.stats(&query, Utc::now()).await?))
}

/// DELETE /api/surveys/:id
pub async fn delete_survey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    if !repo.delete(id).await? {
        return Err(ApiError::NotFound("Survey not found".to_string()));
    }

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Surveys,
        format!("Survey {} deleted", id),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn resolve_template(
    state: &AppState,
    request: &TriggerSurveyRequest,
) -> Result<Template, ApiError> {
    let repo = TemplateRepository::new(state.pool.clone());

    let template = if let Some(template_id) = request.template_id {
        repo.find_by_id(template_id).await?
    } else if let Some(ref name) = request.template_name {
        repo.find_by_internal_name(name).await?
    } else {
        return Err(ApiError::Validation(
            "Either templateId or templateName is required".to_string(),
        ));
    };

    template.ok_or_else(|| ApiError::NotFound("Template not found".to_string()))
}

/// The submitted answer keys must match the template's question set
/// exactly: one score per question, no extras.
fn validate_answers(request: &SubmitSurveyRequest, template: &Template) -> Result<(), ApiError> {
    let expected: HashSet<Uuid> = template.questions.iter().map(|q| q.id).collect();
    let submitted: HashSet<Uuid> = request.answers.keys().copied().collect();

    if expected != submitted {
        return Err(ApiError::Validation(
            "Answers must cover every question of the survey exactly once".to_string(),
        ));
    }

    if request.answers.values().any(|v| !v.is_finite()) {
        return Err(ApiError::Validation(
            "Answer values must be finite numbers".to_string(),
        ));
    }

    Ok(())
}

async fn deliver_invitation(
    state: &AppState,
    survey: &Survey,
    template: &Template,
) -> Result<(), ApiError> {
    let settings = SettingRepository::new(state.pool.clone()).get_all().await?;

    state
        .email
        .send_invitation(survey, template, &settings)
        .await
        .map_err(|e| match e {
            EmailError::NotConfigured => {
                ApiError::Configuration("SMTP is not configured".to_string())
            }
            other => ApiError::EmailDelivery(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn template_with_questions(ids: &[Uuid]) -> Template {
        let template_id = Uuid::new_v4();
        Template {
            id: template_id,
            title: "Feedback Request".to_string(),
            internal_name: None,
            intro_text: None,
            logo_url: None,
            html_design: None,
            email_subject: None,
            email_body: None,
            comment_label: None,
            submit_button_label: None,
            thank_you_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            questions: ids
                .iter()
                .enumerate()
                .map(|(i, id)| domain::models::Question {
                    id: *id,
                    template_id,
                    text: format!("Question {}", i + 1),
                    position: i as i32,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_answers_exact_match() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let template = template_with_questions(&[q1, q2]);

        let mut answers = HashMap::new();
        answers.insert(q1, 4.0);
        answers.insert(q2, 5.0);
        let request = SubmitSurveyRequest {
            answers,
            comment: None,
        };

        assert!(validate_answers(&request, &template).is_ok());
    }

    #[test]
    fn test_validate_answers_missing_question() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let template = template_with_questions(&[q1, q2]);

        let mut answers = HashMap::new();
        answers.insert(q1, 4.0);
        let request = SubmitSurveyRequest {
            answers,
            comment: None,
        };

        assert!(validate_answers(&request, &template).is_err());
    }

    #[test]
    fn test_validate_answers_unknown_question() {
        let q1 = Uuid::new_v4();
        let template = template_with_questions(&[q1]);

        let mut answers = HashMap::new();
        answers.insert(q1, 4.0);
        answers.insert(Uuid::new_v4(), 3.0);
        let request = SubmitSurveyRequest {
            answers,
            comment: None,
        };

        assert!(validate_answers(&request, &template).is_err());
    }

    #[test]
    fn test_validate_answers_rejects_nan() {
        let q1 = Uuid::new_v4();
        let template = template_with_questions(&[q1]);

        let mut answers = HashMap::new();
        answers.insert(q1, f64::NAN);
        let request = SubmitSurveyRequest {
            answers,
            comment: None,
        };

        assert!(validate_answers(&request, &template).is_err());
    }
}
