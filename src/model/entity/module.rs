use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use super::Topic;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Module {
    id: Uuid,
    title: String,
    description: String,
    prerequisite_module_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub prerequisite_module_id: Option<Uuid>,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prerequisite_module_id(&self) -> Option<Uuid> {
        self.prerequisite_module_id
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, Uuid> for Module {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO modules (id, title, description, prerequisite_module_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.prerequisite_module_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE modules SET title = $1, description = $2, prerequisite_module_id = $3 WHERE id = $4",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.prerequisite_module_id)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.prerequisite_module_id = data.prerequisite_module_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE modules SET is_deleted = TRUE, deleted_at = now() WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules WHERE id = $1 AND NOT is_deleted")
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
            "SELECT * FROM modules WHERE NOT is_deleted ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules WHERE NOT is_deleted")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Module, ModuleCreate, Uuid);

impl Module {
    pub async fn attach_topic(
        &self,
        mm: &ModelManager,
        topic_id: Uuid,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query("INSERT INTO module_topics (module_id, topic_id, position) VALUES ($1, $2, $3)")
            .bind(self.id)
            .bind(topic_id)
            .bind(position)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    pub async fn detach_topic(&self, mm: &ModelManager, topic_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM module_topics WHERE module_id = $1 AND topic_id = $2")
            .bind(self.id)
            .bind(topic_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn topics(&self, mm: &ModelManager) -> DatabaseResult<Vec<Topic>> {
        let found = sqlx::query_as(
            r#"
            SELECT t.* FROM topics t
            JOIN module_topics mt ON mt.topic_id = t.id
            WHERE mt.module_id = $1 AND NOT t.is_deleted
            ORDER BY mt.position
            "#,
        )
        .bind(self.id)
        .fetch_all(mm.executor())
        .await?;
        Ok(found)
    }
}
