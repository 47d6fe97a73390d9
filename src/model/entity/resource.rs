use std::str::FromStr;

use crate::impl_paginatable_for;
use crate::integrations::MediaKind;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Learning material kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Video,
    Image,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
            Self::Image => "image",
        }
    }

    /// CDN upload type; documents are stored as raw files.
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Document => MediaKind::Raw,
            Self::Video => MediaKind::Video,
            Self::Image => MediaKind::Image,
        }
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            other => Err(format!("unknown resource type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Resource {
    id: Uuid,
    title: String,
    description: String,
    url: String,
    resource_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ResourceCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub resource_type: ResourceKind,
}

impl ResourceTyped for Resource {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Resource
    }
}

impl Resource {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        self.resource_type.parse().ok()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl CrudRepository<Resource, ResourceCreate, Uuid> for Resource {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ResourceCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO resources (id, title, description, url, resource_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.url)
        .bind(data.resource_type.as_str())
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ResourceCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE resources SET title = $1, description = $2, url = $3, resource_type = $4 WHERE id = $5",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.url)
        .bind(data.resource_type.as_str())
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.url = data.url;
        self.resource_type = data.resource_type.as_str().to_string();
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM resources WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM resources WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM resources ORDER BY created_at LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Resource, ResourceCreate, Uuid);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Video".parse::<ResourceKind>(), Ok(ResourceKind::Video));
        assert_eq!(" document ".parse::<ResourceKind>(), Ok(ResourceKind::Document));
        assert!("audio".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn documents_upload_as_raw_files() {
        assert_eq!(ResourceKind::Document.media_kind(), MediaKind::Raw);
        assert_eq!(ResourceKind::Video.media_kind(), MediaKind::Video);
    }
}
