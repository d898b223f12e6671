//! Survey template management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    question_sets_match, CreateTemplateRequest, LogLevel, LogSource, Template,
    UpdateTemplateRequest,
};
use persistence::repositories::TemplateRepository;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::oplog;

/// GET /api/templates
pub async fn list_templates(State(state): State<AppState>) -> Result<Json<Vec<Template>>, ApiError> {
    let repo = TemplateRepository::new(state.pool.clone());
    Ok(Json(repo.list().await?))
}

/// GET /api/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Template>, ApiError> {
    let repo = TemplateRepository::new(state.pool.clone());
    let template = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;
    Ok(Json(template))
}

/// POST /api/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    request.validate()?;

    let repo = TemplateRepository::new(state.pool.clone());
    // A duplicate internal_name surfaces as 409 via the sqlx conversion
    let template = repo.create(&request).await?;

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Templates,
        format!("Template \"{}\" created", template.title),
        None,
    );

    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /api/templates/:id
///
/// Once any survey answers exist against a template, the question set is
/// frozen: answers reference questions, and replacing them would orphan
/// the scores. Cosmetic fields stay editable.
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>, ApiError> {
    request.validate()?;

    let repo = TemplateRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    let existing_texts: Vec<String> =
        existing.questions.iter().map(|q| q.text.clone()).collect();
    let questions_changed = !question_sets_match(&existing_texts, &request.questions);

    if questions_changed && repo.has_answers(id).await? {
        return Err(ApiError::Conflict(
            "Questions cannot be changed once answers have been submitted".to_string(),
        ));
    }

    let template = repo
        .update(id, &request, questions_changed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(Json(template))
}

/// DELETE /api/templates/:id
///
/// Fails with 409 while surveys reference the template.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TemplateRepository::new(state.pool.clone());
    let deleted = repo.delete(id).await.map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict(
            "Template has surveys and cannot be deleted".to_string(),
        ),
        other => other,
    })?;

    if !deleted {
        return Err(ApiError::NotFound("Template not found".to_string()));
    }

    oplog::log(
        &state.pool,
        LogLevel::Info,
        LogSource::Templates,
        format!("Template {} deleted", id),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
