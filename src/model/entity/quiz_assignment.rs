use crate::domain::scoring;
use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A question paper published to learners, optionally tied to a program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAssignment {
    id: Uuid,
    program_id: Option<Uuid>,
    question_paper_id: Uuid,
    title: String,
    description: String,
    /// Free-form settings, e.g. `{"settings": {"time_limit_seconds": 600}}`.
    #[schema(value_type = Object)]
    rules: Value,
    unique_link_token: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuizAssignmentCreate {
    pub program_id: Option<Uuid>,
    pub question_paper_id: Uuid,
    pub title: String,
    pub description: String,
    pub rules: Value,
    pub enabled: bool,
}

impl ResourceTyped for QuizAssignment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAssignment
    }
}

impl QuizAssignment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn program_id(&self) -> Option<Uuid> {
        self.program_id
    }

    pub fn question_paper_id(&self) -> Uuid {
        self.question_paper_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rules(&self) -> &Value {
        &self.rules
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn time_limit_seconds(&self) -> Option<i64> {
        scoring::time_limit_seconds(&self.rules)
    }
}

#[async_trait]
impl CrudRepository<QuizAssignment, QuizAssignmentCreate, Uuid> for QuizAssignment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAssignmentCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO quiz_assignments
                (id, program_id, question_paper_id, title, description, rules, unique_link_token, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.program_id)
        .bind(data.question_paper_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.rules)
        .bind(Uuid::new_v4().simple().to_string())
        .bind(data.enabled)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAssignmentCreate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE quiz_assignments SET
                program_id = $1, question_paper_id = $2, title = $3,
                description = $4, rules = $5, enabled = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.program_id)
        .bind(data.question_paper_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.rules)
        .bind(data.enabled)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    /// Soft delete, attempts keep pointing at the row.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE quiz_assignments SET is_deleted = TRUE, deleted_at = now() WHERE id = $1",
        )
        .bind(self.id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM quiz_assignments WHERE id = $1 AND NOT is_deleted")
                .bind(id)
                .fetch_one(mm.executor())
                .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    /// Enabled and not deleted only.
    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM quiz_assignments
            WHERE enabled AND NOT is_deleted
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_assignments WHERE enabled AND NOT is_deleted",
        )
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }
}

impl_paginatable_for!(QuizAssignment, QuizAssignmentCreate, Uuid);
