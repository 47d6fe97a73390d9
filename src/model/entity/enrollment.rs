use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A learner's access to a program. At most one per learner and program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    learner_id: Uuid,
    program_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn program_id(&self) -> Uuid {
        self.program_id
    }

    /// Fails with a unique violation when the learner is already enrolled.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        learner_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, learner_id, program_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(learner_id)
        .bind(program_id)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    pub async fn find(
        mm: &ModelManager,
        learner_id: Uuid,
        program_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as(
            "SELECT * FROM enrollments WHERE learner_id = $1 AND program_id = $2",
        )
        .bind(learner_id)
        .bind(program_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn program_ids_for(mm: &ModelManager, learner_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT program_id FROM enrollments WHERE learner_id = $1 ORDER BY created_at",
        )
        .bind(learner_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(ids)
    }

    pub async fn delete(self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.learner_id)
    }
}
