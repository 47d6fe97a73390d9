use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// An ordered selection of pooled questions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuestionPaper {
    id: Uuid,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionPaperCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ResourceTyped for QuestionPaper {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuestionPaper
    }
}

impl QuestionPaper {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[async_trait]
impl CrudRepository<QuestionPaper, QuestionPaperCreate, Uuid> for QuestionPaper {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionPaperCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO question_papers (id, title, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionPaperCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE question_papers SET title = $1, description = $2 WHERE id = $3")
            .bind(&data.title)
            .bind(&data.description)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title;
        self.description = data.description;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM question_papers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM question_papers WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM question_papers ORDER BY created_at LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM question_papers")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(QuestionPaper, QuestionPaperCreate, Uuid);

impl QuestionPaper {
    pub async fn attach_question(
        &self,
        mm: &ModelManager,
        question_id: Uuid,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO question_paper_questions (question_paper_id, question_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(self.id)
        .bind(question_id)
        .bind(position)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    pub async fn detach_question(&self, mm: &ModelManager, question_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "DELETE FROM question_paper_questions WHERE question_paper_id = $1 AND question_id = $2",
        )
        .bind(self.id)
        .bind(question_id)
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
