//! Repository for survey template database operations.

use std::collections::HashMap;

use domain::models::{
    CreateTemplateRequest, Question, Template, UpdateTemplateRequest, DEFAULT_TEMPLATE_TITLE,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{QuestionEntity, TemplateEntity};
use crate::metrics::QueryTimer;

const TEMPLATE_COLUMNS: &str = "id, title, internal_name, intro_text, logo_url, html_design, \
     email_subject, email_body, comment_label, submit_button_label, thank_you_message, \
     created_at, updated_at";

/// Repository for template operations.
#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    /// Creates a new template repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all templates with their questions, newest first.
    pub async fn list(&self) -> Result<Vec<Template>, sqlx::Error> {
        let timer = QueryTimer::new("list_templates");
        let templates = sqlx::query_as::<_, TemplateEntity>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = templates.iter().map(|t| t.id).collect();
        let questions = self.questions_for(&ids).await?;
        timer.record();

        Ok(assemble(templates, questions))
    }

    /// Finds a template with its questions by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, sqlx::Error> {
        let timer = QueryTimer::new("find_template_by_id");
        let template = sqlx::query_as::<_, TemplateEntity>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let result = match template {
            Some(entity) => {
                let questions = self.questions_for(&[entity.id]).await?;
                Some(assemble(vec![entity], questions).remove(0))
            }
            None => None,
        };
        timer.record();
        Ok(result)
    }

    /// Finds a template by its unique internal name.
    pub async fn find_by_internal_name(
        &self,
        name: &str,
    ) -> Result<Option<Template>, sqlx::Error> {
        let timer = QueryTimer::new("find_template_by_internal_name");
        let template = sqlx::query_as::<_, TemplateEntity>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE internal_name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let result = match template {
            Some(entity) => {
                let questions = self.questions_for(&[entity.id]).await?;
                Some(assemble(vec![entity], questions).remove(0))
            }
            None => None,
        };
        timer.record();
        Ok(result)
    }

    /// Creates a template and its questions in one transaction.
    pub async fn create(&self, input: &CreateTemplateRequest) -> Result<Template, sqlx::Error> {
        let timer = QueryTimer::new("create_template");
        let mut tx = self.pool.begin().await?;

        let title = input
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TEMPLATE_TITLE);

        let entity = sqlx::query_as::<_, TemplateEntity>(&format!(
            r#"
            INSERT INTO templates (
                title, internal_name, intro_text, logo_url, html_design,
                email_subject, email_body, comment_label, submit_button_label,
                thank_you_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(&input.internal_name)
        .bind(&input.intro_text)
        .bind(&input.logo_url)
        .bind(&input.html_design)
        .bind(&input.email_subject)
        .bind(&input.email_body)
        .bind(&input.comment_label)
        .bind(&input.submit_button_label)
        .bind(&input.thank_you_message)
        .fetch_one(&mut *tx)
        .await?;

        let questions = insert_questions(&mut tx, entity.id, &input.questions).await?;

        tx.commit().await?;
        timer.record();

        Ok(assemble_one(entity, questions))
    }

    /// Updates a template's fields and replaces its question set in one
    /// transaction. Question replacement requires that no answers exist
    /// against the template; the caller checks that via [`Self::has_answers`].
    pub async fn update(
        &self,
        id: Uuid,
        input: &UpdateTemplateRequest,
        replace_questions: bool,
    ) -> Result<Option<Template>, sqlx::Error> {
        let timer = QueryTimer::new("update_template");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, TemplateEntity>(&format!(
            r#"
            UPDATE templates
            SET title = COALESCE($2, title),
                internal_name = $3,
                intro_text = $4,
                logo_url = $5,
                html_design = $6,
                email_subject = $7,
                email_body = $8,
                comment_label = $9,
                submit_button_label = $10,
                thank_you_message = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.internal_name)
        .bind(&input.intro_text)
        .bind(&input.logo_url)
        .bind(&input.html_design)
        .bind(&input.email_subject)
        .bind(&input.email_body)
        .bind(&input.comment_label)
        .bind(&input.submit_button_label)
        .bind(&input.thank_you_message)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entity) = entity else {
            timer.record();
            return Ok(None);
        };

        let questions = if replace_questions {
            sqlx::query("DELETE FROM questions WHERE template_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_questions(&mut tx, id, &input.questions).await?
        } else {
            sqlx::query_as::<_, QuestionEntity>(
                "SELECT id, template_id, text, position FROM questions \
                 WHERE template_id = $1 ORDER BY position",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
        };

        tx.commit().await?;
        timer.record();

        Ok(Some(assemble_one(entity, questions)))
    }

    /// Deletes a template. Fails with a foreign key violation when surveys
    /// still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_template");
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Whether any submitted answers exist against this template's questions.
    pub async fn has_answers(&self, template_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("template_has_answers");
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM answers a
                JOIN questions q ON q.id = a.question_id
                WHERE q.template_id = $1
            )
            "#,
        )
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(exists)
    }

    async fn questions_for(&self, template_ids: &[Uuid]) -> Result<Vec<QuestionEntity>, sqlx::Error> {
        if template_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, QuestionEntity>(
            "SELECT id, template_id, text, position FROM questions \
             WHERE template_id = ANY($1) ORDER BY position",
        )
        .bind(template_ids)
        .fetch_all(&self.pool)
        .await
    }
}

async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    template_id: Uuid,
    texts: &[String],
) -> Result<Vec<QuestionEntity>, sqlx::Error> {
    let mut questions = Vec::with_capacity(texts.len());
    for (position, text) in texts.iter().enumerate() {
        let question = sqlx::query_as::<_, QuestionEntity>(
            r#"
            INSERT INTO questions (template_id, text, position)
            VALUES ($1, $2, $3)
            RETURNING id, template_id, text, position
            "#,
        )
        .bind(template_id)
        .bind(text.trim())
        .bind(position as i32)
        .fetch_one(&mut **tx)
        .await?;
        questions.push(question);
    }
    Ok(questions)
}

fn assemble(templates: Vec<TemplateEntity>, questions: Vec<QuestionEntity>) -> Vec<Template> {
    let mut by_template: HashMap<Uuid, Vec<Question>> = HashMap::new();
    for q in questions {
        by_template
            .entry(q.template_id)
            .or_default()
            .push(question_to_domain(q));
    }
    templates
        .into_iter()
        .map(|t| {
            let questions = by_template.remove(&t.id).unwrap_or_default();
            template_to_domain(t, questions)
        })
        .collect()
}

fn assemble_one(entity: TemplateEntity, questions: Vec<QuestionEntity>) -> Template {
    let questions = questions.into_iter().map(question_to_domain).collect();
    template_to_domain(entity, questions)
}

pub(crate) fn template_to_domain(entity: TemplateEntity, questions: Vec<Question>) -> Template {
    Template {
        id: entity.id,
        title: entity.title,
        internal_name: entity.internal_name,
        intro_text: entity.intro_text,
        logo_url: entity.logo_url,
        html_design: entity.html_design,
        email_subject: entity.email_subject,
        email_body: entity.email_body,
        comment_label: entity.comment_label,
        submit_button_label: entity.submit_button_label,
        thank_you_message: entity.thank_you_message,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
        questions,
    }
}

pub(crate) fn question_to_domain(entity: QuestionEntity) -> Question {
    Question {
        id: entity.id,
        template_id: entity.template_id,
        text: entity.text,
        position: entity.position,
    }
}
