//! Repository for survey database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::models::{
    stats_period_starts, Answer, ListSurveysQuery, Survey, SurveyStats, SurveyStatsQuery,
    SurveyStatus, Template,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{AnswerEntity, QuestionEntity, SurveyEntity, TemplateEntity};
use crate::metrics::QueryTimer;
use crate::repositories::template::{question_to_domain, template_to_domain};

const SURVEY_COLUMNS: &str = "id, template_id, reference, employee, addressee_email, status, \
     comment, average_score, created_at, answered_at";

/// Helper for building dynamic WHERE clauses from survey list filters.
/// Tracks conditions and parameter positions to avoid duplication.
struct SurveyFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl SurveyFilterBuilder {
    fn build(filters: &SurveyFilters) -> Self {
        let mut conditions = vec!["TRUE".to_string()];
        let mut param_count = 0;

        if filters.reference_pattern.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(reference ILIKE ${p} OR addressee_email ILIKE ${p})",
                p = param_count
            ));
        }

        if filters.employee_pattern.is_some() {
            param_count += 1;
            conditions.push(format!("employee ILIKE ${}", param_count));
        }

        if filters.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${}", param_count));
        }

        if filters.created_from.is_some() {
            param_count += 1;
            conditions.push(format!("created_at >= ${}", param_count));
        }

        if filters.created_until.is_some() {
            param_count += 1;
            conditions.push(format!("created_at <= ${}", param_count));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    fn param_count(&self) -> i32 {
        self.param_count
    }
}

/// Resolved filter values, ILIKE patterns pre-wrapped with wildcards.
struct SurveyFilters {
    reference_pattern: Option<String>,
    employee_pattern: Option<String>,
    status: Option<SurveyStatus>,
    created_from: Option<DateTime<Utc>>,
    created_until: Option<DateTime<Utc>>,
}

impl SurveyFilters {
    fn from_list_query(query: &ListSurveysQuery) -> Self {
        Self {
            reference_pattern: query.reference.as_deref().map(like_pattern),
            employee_pattern: query.employee.as_deref().map(like_pattern),
            status: query.status_filter(),
            created_from: query.created_from(),
            created_until: query.created_until(),
        }
    }

    fn from_stats_query(query: &SurveyStatsQuery) -> Self {
        Self {
            reference_pattern: query.reference.as_deref().map(like_pattern),
            employee_pattern: query.employee.as_deref().map(like_pattern),
            status: Some(SurveyStatus::Answered),
            created_from: None,
            created_until: None,
        }
    }
}

fn like_pattern(value: &str) -> String {
    format!("%{}%", value)
}

/// Macro to bind optional survey filter parameters to a SQLx builder.
macro_rules! bind_survey_filters {
    ($builder:expr, $filters:expr) => {{
        let mut b = $builder;
        if let Some(ref pattern) = $filters.reference_pattern {
            b = b.bind(pattern);
        }
        if let Some(ref pattern) = $filters.employee_pattern {
            b = b.bind(pattern);
        }
        if let Some(status) = $filters.status {
            b = b.bind(status.as_str());
        }
        if let Some(from) = $filters.created_from {
            b = b.bind(from);
        }
        if let Some(until) = $filters.created_until {
            b = b.bind(until);
        }
        b
    }};
}

/// Repository for survey operations.
#[derive(Clone)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    /// Creates a new survey repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new open survey for the given template.
    pub async fn insert(
        &self,
        template_id: Uuid,
        reference: Option<&str>,
        employee: &str,
        addressee_email: &str,
    ) -> Result<Survey, sqlx::Error> {
        let timer = QueryTimer::new("insert_survey");
        let entity = sqlx::query_as::<_, SurveyEntity>(&format!(
            r#"
            INSERT INTO surveys (template_id, reference, employee, addressee_email, status)
            VALUES ($1, $2, $3, $4, 'open')
            RETURNING {SURVEY_COLUMNS}
            "#
        ))
        .bind(template_id)
        .bind(reference)
        .bind(employee)
        .bind(addressee_email)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(survey_to_domain(entity, None, Vec::new()))
    }

    /// Finds a survey by id, with its template, questions and answers.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Survey>, sqlx::Error> {
        let timer = QueryTimer::new("find_survey_by_id");
        let entity = sqlx::query_as::<_, SurveyEntity>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let result = match entity {
            Some(entity) => Some(self.hydrate(vec![entity]).await?.remove(0)),
            None => None,
        };
        timer.record();
        Ok(result)
    }

    /// Lists surveys matching the given filters, newest first, with
    /// templates and answers attached.
    pub async fn list(&self, query: &ListSurveysQuery) -> Result<Vec<Survey>, sqlx::Error> {
        let timer = QueryTimer::new("list_surveys");
        let filters = SurveyFilters::from_list_query(query);
        let builder = SurveyFilterBuilder::build(&filters);

        let sql = format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE {} ORDER BY created_at DESC",
            builder.where_clause()
        );
        debug_assert!(builder.param_count() <= 5);

        let q = sqlx::query_as::<_, SurveyEntity>(&sql);
        let q = bind_survey_filters!(q, filters);
        let entities = q.fetch_all(&self.pool).await?;

        let result = self.hydrate(entities).await?;
        timer.record();
        Ok(result)
    }

    /// Records a submission: inserts one answer per question, sets the
    /// comment and average score and flips the status, all in one
    /// transaction. Returns `None` when the survey is missing or has
    /// already been answered.
    pub async fn submit(
        &self,
        survey_id: Uuid,
        answers: &HashMap<Uuid, f64>,
        comment: Option<&str>,
        average_score: f64,
    ) -> Result<Option<Survey>, sqlx::Error> {
        let timer = QueryTimer::new("submit_survey");
        let mut tx = self.pool.begin().await?;

        // The status guard makes double submission a no-op race-free:
        // the second writer sees zero rows and rolls back.
        let entity = sqlx::query_as::<_, SurveyEntity>(&format!(
            r#"
            UPDATE surveys
            SET status = 'answered',
                comment = $2,
                average_score = $3,
                answered_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {SURVEY_COLUMNS}
            "#
        ))
        .bind(survey_id)
        .bind(comment)
        .bind(average_score)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entity) = entity else {
            timer.record();
            return Ok(None);
        };

        let mut inserted = Vec::with_capacity(answers.len());
        for (question_id, value) in answers {
            let answer = sqlx::query_as::<_, AnswerEntity>(
                r#"
                INSERT INTO answers (survey_id, question_id, value)
                VALUES ($1, $2, $3)
                RETURNING id, survey_id, question_id, value, created_at
                "#,
            )
            .bind(survey_id)
            .bind(question_id)
            .bind(value)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(answer);
        }

        tx.commit().await?;
        timer.record();

        let answers = inserted.into_iter().map(answer_to_domain).collect();
        Ok(Some(survey_to_domain(entity, None, answers)))
    }

    /// Average scores of answered surveys created since the start of the
    /// current calendar year, quarter and month. Missing periods average
    /// to zero.
    pub async fn stats(
        &self,
        query: &SurveyStatsQuery,
        now: DateTime<Utc>,
    ) -> Result<SurveyStats, sqlx::Error> {
        let timer = QueryTimer::new("survey_stats");
        let (year_start, quarter_start, month_start) = stats_period_starts(now);

        let filters = SurveyFilters::from_stats_query(query);
        let builder = SurveyFilterBuilder::build(&filters);
        let base = builder.param_count();

        let sql = format!(
            r#"
            SELECT
                COALESCE(AVG(average_score) FILTER (WHERE created_at >= ${y}), 0) AS year_avg,
                COALESCE(AVG(average_score) FILTER (WHERE created_at >= ${q}), 0) AS quarter_avg,
                COALESCE(AVG(average_score) FILTER (WHERE created_at >= ${m}), 0) AS month_avg
            FROM surveys
            WHERE {clause} AND average_score IS NOT NULL
            "#,
            y = base + 1,
            q = base + 2,
            m = base + 3,
            clause = builder.where_clause()
        );

        let q = sqlx::query_as::<_, (f64, f64, f64)>(&sql);
        let q = bind_survey_filters!(q, filters);
        let (year, quarter, month) = q
            .bind(year_start)
            .bind(quarter_start)
            .bind(month_start)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        Ok(SurveyStats {
            year,
            quarter,
            month,
        })
    }

    /// Deletes a survey; its answers and email logs cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_survey");
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Deletes surveys created before the cutoff. Used by the retention
    /// cleanup job. Returns the number of surveys removed.
    pub async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_surveys_before");
        let result = sqlx::query("DELETE FROM surveys WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Attaches templates (with questions) and answers to the given rows.
    async fn hydrate(&self, entities: Vec<SurveyEntity>) -> Result<Vec<Survey>, sqlx::Error> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let survey_ids: Vec<Uuid> = entities.iter().map(|s| s.id).collect();
        let mut template_ids: Vec<Uuid> = entities.iter().map(|s| s.template_id).collect();
        template_ids.sort_unstable();
        template_ids.dedup();

        let templates = sqlx::query_as::<_, TemplateEntity>(
            "SELECT id, title, internal_name, intro_text, logo_url, html_design, \
             email_subject, email_body, comment_label, submit_button_label, \
             thank_you_message, created_at, updated_at \
             FROM templates WHERE id = ANY($1)",
        )
        .bind(&template_ids)
        .fetch_all(&self.pool)
        .await?;

        let questions = sqlx::query_as::<_, QuestionEntity>(
            "SELECT id, template_id, text, position FROM questions \
             WHERE template_id = ANY($1) ORDER BY position",
        )
        .bind(&template_ids)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, AnswerEntity>(
            "SELECT id, survey_id, question_id, value, created_at FROM answers \
             WHERE survey_id = ANY($1)",
        )
        .bind(&survey_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut questions_by_template: HashMap<Uuid, Vec<_>> = HashMap::new();
        for q in questions {
            questions_by_template
                .entry(q.template_id)
                .or_default()
                .push(question_to_domain(q));
        }

        let mut templates_by_id: HashMap<Uuid, Template> = templates
            .into_iter()
            .map(|t| {
                let qs = questions_by_template.remove(&t.id).unwrap_or_default();
                (t.id, template_to_domain(t, qs))
            })
            .collect();

        let mut answers_by_survey: HashMap<Uuid, Vec<Answer>> = HashMap::new();
        for a in answers {
            answers_by_survey
                .entry(a.survey_id)
                .or_default()
                .push(answer_to_domain(a));
        }

        Ok(entities
            .into_iter()
            .map(|entity| {
                let template = templates_by_id.get(&entity.template_id).cloned();
                let answers = answers_by_survey.remove(&entity.id).unwrap_or_default();
                survey_to_domain(entity, template, answers)
            })
            .collect())
    }
}

fn survey_to_domain(
    entity: SurveyEntity,
    template: Option<Template>,
    answers: Vec<Answer>,
) -> Survey {
    Survey {
        id: entity.id,
        template_id: entity.template_id,
        reference: entity.reference,
        employee: entity.employee,
        addressee_email: entity.addressee_email,
        status: entity
            .status
            .parse()
            .unwrap_or(SurveyStatus::Open),
        comment: entity.comment,
        average_score: entity.average_score,
        created_at: entity.created_at,
        answered_at: entity.answered_at,
        template,
        answers,
    }
}

fn answer_to_domain(entity: AnswerEntity) -> Answer {
    Answer {
        id: entity.id,
        survey_id: entity.survey_id,
        question_id: entity.question_id,
        value: entity.value,
        created_at: entity.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder_no_filters() {
        let filters = SurveyFilters::from_list_query(&ListSurveysQuery::default());
        let builder = SurveyFilterBuilder::build(&filters);
        assert_eq!(builder.where_clause(), "TRUE");
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_filter_builder_all_filters() {
        let query = ListSurveysQuery {
            reference: Some("INV-42".into()),
            employee: Some("smith".into()),
            status: Some("answered".into()),
            start_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            end_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()),
        };
        let filters = SurveyFilters::from_list_query(&query);
        let builder = SurveyFilterBuilder::build(&filters);
        assert_eq!(builder.param_count(), 5);
        let clause = builder.where_clause();
        assert!(clause.contains("reference ILIKE $1"));
        assert!(clause.contains("addressee_email ILIKE $1"));
        assert!(clause.contains("employee ILIKE $2"));
        assert!(clause.contains("status = $3"));
        assert!(clause.contains("created_at >= $4"));
        assert!(clause.contains("created_at <= $5"));
    }

    #[test]
    fn test_filter_builder_status_all_disables_filter() {
        let query = ListSurveysQuery {
            status: Some("all".into()),
            ..Default::default()
        };
        let filters = SurveyFilters::from_list_query(&query);
        let builder = SurveyFilterBuilder::build(&filters);
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_stats_filters_pin_answered_status() {
        let filters = SurveyFilters::from_stats_query(&SurveyStatsQuery::default());
        assert_eq!(filters.status, Some(SurveyStatus::Answered));
        let builder = SurveyFilterBuilder::build(&filters);
        assert_eq!(builder.where_clause(), "TRUE AND status = $1");
    }

    #[test]
    fn test_like_pattern_wraps_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
    }
}
