use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    profile_image: Option<String>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UserEntityCreateUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Ignored on update, passwords change through [`UserEntity::set_password`].
    pub password_hash: String,
    pub role: UserRole,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn profile_image(&self) -> Option<&str> {
        self.profile_image.as_deref()
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.email.trim().to_lowercase())
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let email = data.email.trim().to_lowercase();
        sqlx::query("UPDATE users SET email = $1, first_name = $2, last_name = $3 WHERE id = $4")
            .bind(&email)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.email = email;
        self.first_name = data.first_name;
        self.last_name = data.last_name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    /// Emails are stored lowercased, lookups are case-insensitive.
    pub async fn find_by_email(mm: &ModelManager, email: &str) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }

    pub async fn touch_last_login(&mut self, mm: &ModelManager) -> DatabaseResult<()> {
        let now: DateTime<Utc> =
            sqlx::query_scalar("UPDATE users SET last_login = now() WHERE id = $1 RETURNING last_login")
                .bind(self.id)
                .fetch_one(mm.executor())
                .await?;
        self.last_login = Some(now);
        Ok(())
    }

    pub async fn set_password(&mut self, mm: &ModelManager, password_hash: String) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        self.password_hash = password_hash;
        Ok(())
    }

    pub async fn set_profile_image(
        mut self,
        mm: &ModelManager,
        url: Option<String>,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET profile_image = $1 WHERE id = $2")
            .bind(&url)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        self.profile_image = url;
        Ok(self)
    }
}
