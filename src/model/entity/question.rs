use crate::domain::{GradableQuestion, QuestionType};
use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A question from the shared pool.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    author_id: Uuid,
    question_text: String,
    question_type: String,
    #[schema(value_type = Option<Object>)]
    options: Option<Value>,
    #[schema(value_type = Option<Object>)]
    correct_answer: Option<Value>,
    points: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuestionCreate {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Value>,
    pub correct_answer: Option<Value>,
    pub points: i32,
}

/// What a learner sees while answering: no correct answer.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: String,
    #[schema(value_type = Option<Object>)]
    pub options: Option<Value>,
    pub points: i32,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_type(&self) -> Option<QuestionType> {
        self.question_type.parse().ok()
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    /// `None` for rows with an unknown question type, those cannot be graded.
    pub fn gradable(&self) -> Option<GradableQuestion> {
        Some(GradableQuestion {
            id: self.id,
            question_type: self.question_type()?,
            correct_answer: self.correct_answer.clone(),
            points: self.points,
        })
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            question_text: self.question_text.clone(),
            question_type: self.question_type.clone(),
            options: self.options.clone(),
            points: self.points,
        }
    }
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO question_pool
                (id, author_id, question_text, question_type, options, correct_answer, points)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.question_text)
        .bind(data.question_type.as_str())
        .bind(&data.options)
        .bind(&data.correct_answer)
        .bind(data.points)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE question_pool SET
                question_text = $1, question_type = $2, options = $3,
                correct_answer = $4, points = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.question_text)
        .bind(data.question_type.as_str())
        .bind(&data.options)
        .bind(&data.correct_answer)
        .bind(data.points)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM question_pool WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM question_pool WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM question_pool ORDER BY created_at LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM question_pool")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Question, QuestionCreate, Uuid);

#[async_trait]
impl HasOwner for Question {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

impl Question {
    /// Questions of a paper in position order.
    pub async fn for_paper(mm: &ModelManager, paper_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let found = sqlx::query_as(
            r#"
            SELECT q.* FROM question_pool q
            JOIN question_paper_questions pq ON pq.question_id = q.id
            WHERE pq.question_paper_id = $1
            ORDER BY pq.position
            "#,
        )
        .bind(paper_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(found)
    }
}
