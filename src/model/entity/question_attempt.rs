use std::collections::HashMap;

use crate::domain::QuestionGrade;
use crate::model::{ModelManager, error::DatabaseResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// The answer given to one question within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuestionAttempt {
    id: Uuid,
    quiz_attempt_id: Uuid,
    question_id: Uuid,
    #[schema(value_type = Object)]
    answer: Value,
    is_correct: bool,
    points_earned: i32,
}

impl QuestionAttempt {
    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// Inserts or replaces the learner's answer to a question.
    pub async fn save(
        mm: &ModelManager,
        quiz_attempt_id: Uuid,
        answer: &Value,
        grade: &QuestionGrade,
    ) -> DatabaseResult<Self> {
        let saved = sqlx::query_as(
            r#"
            INSERT INTO question_attempts
                (id, quiz_attempt_id, question_id, answer, is_correct, points_earned)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (quiz_attempt_id, question_id) DO UPDATE SET
                answer = EXCLUDED.answer,
                is_correct = EXCLUDED.is_correct,
                points_earned = EXCLUDED.points_earned,
                answered_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(quiz_attempt_id)
        .bind(grade.question_id)
        .bind(answer)
        .bind(grade.is_correct)
        .bind(grade.points_earned)
        .fetch_one(mm.executor())
        .await?;

        Ok(saved)
    }

    /// Question id -> stored answer.
    pub async fn answers_for(
        mm: &ModelManager,
        quiz_attempt_id: Uuid,
    ) -> DatabaseResult<HashMap<Uuid, Value>> {
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(
            "SELECT question_id, answer FROM question_attempts WHERE quiz_attempt_id = $1",
        )
        .bind(quiz_attempt_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows.into_iter().collect())
    }
}
