use crate::domain::{AttemptSummary, QuizScore, QuizStatus, scoring};
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub static STATUS_IN_PROGRESS: &str = "in_progress";
pub static STATUS_COMPLETED: &str = "completed";

/// One learner's run through an assignment. A learner gets a single attempt
/// per assignment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    assignment_id: Uuid,
    learner_id: Uuid,
    status: String,
    score: f64,
    passed: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status_at(&self, time_limit: Option<i64>, now: DateTime<Utc>) -> QuizStatus {
        scoring::quiz_status(
            Some(self.is_completed()),
            self.started_at,
            self.score,
            time_limit,
            now,
        )
    }

    /// Fails with a unique violation when the learner already started.
    pub async fn start(
        mm: &ModelManager,
        assignment_id: Uuid,
        learner_id: Uuid,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, assignment_id, learner_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(assignment_id)
        .bind(learner_id)
        .bind(STATUS_IN_PROGRESS)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    pub async fn find_for(
        mm: &ModelManager,
        assignment_id: Uuid,
        learner_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as(
            "SELECT * FROM quiz_attempts WHERE assignment_id = $1 AND learner_id = $2",
        )
        .bind(assignment_id)
        .bind(learner_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(found)
    }

    /// Stores the running score of an in-progress attempt.
    pub async fn update_score(mut self, mm: &ModelManager, score: &QuizScore) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quiz_attempts SET score = $1, passed = $2 WHERE id = $3")
            .bind(score.score)
            .bind(score.passed)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.score = score.score;
        self.passed = score.passed;
        Ok(self)
    }

    pub async fn complete(self, mm: &ModelManager, score: &QuizScore) -> DatabaseResult<Self> {
        let completed = sqlx::query_as(
            r#"
            UPDATE quiz_attempts
            SET status = $1, score = $2, passed = $3, completed_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(STATUS_COMPLETED)
        .bind(score.score)
        .bind(score.passed)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(completed)
    }

    /// Every attempt of a learner along with the owning assignment's time limit.
    pub async fn summaries_for(
        mm: &ModelManager,
        learner_id: Uuid,
    ) -> DatabaseResult<Vec<AttemptSummary>> {
        let rows: Vec<(Uuid, String, f64, DateTime<Utc>, Value)> = sqlx::query_as(
            r#"
            SELECT qa.assignment_id, qa.status, qa.score, qa.started_at, a.rules
            FROM quiz_attempts qa
            JOIN quiz_assignments a ON a.id = qa.assignment_id
            WHERE qa.learner_id = $1
            "#,
        )
        .bind(learner_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(assignment_id, status, score, started_at, rules)| AttemptSummary {
                assignment_id,
                completed: status == STATUS_COMPLETED,
                score,
                started_at,
                time_limit_seconds: scoring::time_limit_seconds(&rules),
            })
            .collect())
    }
}

#[async_trait]
impl HasOwner for QuizAttempt {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.learner_id)
    }
}
