use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use super::Resource;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Topic {
    id: Uuid,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TopicCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ResourceTyped for Topic {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Topic
    }
}

impl Topic {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[async_trait]
impl CrudRepository<Topic, TopicCreate, Uuid> for Topic {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TopicCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO topics (id, title, description) VALUES ($1, $2, $3) RETURNING *",
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
        data: TopicCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE topics SET title = $1, description = $2 WHERE id = $3")
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
        sqlx::query("UPDATE topics SET is_deleted = TRUE, deleted_at = now() WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM topics WHERE id = $1 AND NOT is_deleted")
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
        let result = sqlx::query_as(
            "SELECT * FROM topics WHERE NOT is_deleted ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics WHERE NOT is_deleted")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Topic, TopicCreate, Uuid);

impl Topic {
    pub async fn attach_resource(
        &self,
        mm: &ModelManager,
        resource_id: Uuid,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO topic_resources (topic_id, resource_id, position) VALUES ($1, $2, $3)",
        )
        .bind(self.id)
        .bind(resource_id)
        .bind(position)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    pub async fn detach_resource(&self, mm: &ModelManager, resource_id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("DELETE FROM topic_resources WHERE topic_id = $1 AND resource_id = $2")
                .bind(self.id)
                .bind(resource_id)
                .execute(mm.executor())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn resources(&self, mm: &ModelManager) -> DatabaseResult<Vec<Resource>> {
        let found = sqlx::query_as(
            r#"
            SELECT r.* FROM resources r
            JOIN topic_resources tr ON tr.resource_id = r.id
            WHERE tr.topic_id = $1
            ORDER BY tr.position
            "#,
        )
        .bind(self.id)
        .fetch_all(mm.executor())
        .await?;
        Ok(found)
    }
}
