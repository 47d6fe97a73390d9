use crate::auth::ResetToken;
use crate::model::{ModelManager, error::DatabaseResult};
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Pending password reset. Only the token digest is kept.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub async fn create(mm: &ModelManager, user_id: Uuid, token: &ResetToken) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO password_resets (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token.hash)
        .bind(token.expires_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    /// Unexpired reset matching the digest, if any.
    pub async fn find_valid(mm: &ModelManager, token_hash: &str) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as(
            "SELECT * FROM password_resets WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(token_hash)
        .fetch_optional(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn delete_for_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected())
    }
}
