use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::{QuestionGrade, QuestionType, QuizScore, QuizStatus},
    model::{
        ResourceType,
        entity::{
            Question, QuestionCreate, QuestionPaper, QuestionView, QuizAssignment,
            QuizAssignmentCreate, QuizAttempt,
        },
    },
    web::{WebError, WebResult},
};

const DEFAULT_POINTS: i64 = 1;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuestionBody {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub options: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub correct_answer: Option<Value>,
    pub points: Option<i64>,
}

impl TryFrom<QuestionBody> for QuestionCreate {
    type Error = WebError;

    fn try_from(body: QuestionBody) -> WebResult<Self> {
        let bad = |details: &str| WebError::resource_bad_request(ResourceType::Question, details);

        let question_text = body
            .question_text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| bad("question_text is required"))?;
        let question_type: QuestionType = body
            .question_type
            .ok_or_else(|| bad("question_type is required"))?
            .parse()
            .map_err(|e: String| bad(&e))?;
        let points = body.points.unwrap_or(DEFAULT_POINTS);
        let points = i32::try_from(points)
            .ok()
            .filter(|p| *p >= 0)
            .ok_or_else(|| bad("points must be a non-negative integer"))?;

        Ok(Self {
            question_text,
            question_type,
            options: body.options,
            correct_answer: body.correct_answer,
            points,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AssignmentBody {
    pub program_id: Option<Uuid>,
    pub question_paper_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub rules: Value,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl From<AssignmentBody> for QuizAssignmentCreate {
    fn from(body: AssignmentBody) -> Self {
        Self {
            program_id: body.program_id,
            question_paper_id: body.question_paper_id,
            title: body.title,
            description: body.description,
            rules: if body.rules.is_null() {
                Value::Object(Default::default())
            } else {
                body.rules
            },
            enabled: body.enabled,
        }
    }
}

/// A paper as admins see it, correct answers included.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PaperDetails {
    #[serde(flatten)]
    pub paper: QuestionPaper,
    pub questions: Vec<Question>,
}

/// An assignment as learners see it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentDetails {
    #[serde(flatten)]
    pub assignment: QuizAssignment,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AnswerBody {
    pub question_id: Uuid,
    #[schema(value_type = Object)]
    pub answer: Value,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttemptResponse {
    pub attempt: QuizAttempt,
    pub status: QuizStatus,
    #[schema(value_type = Object)]
    pub answers: HashMap<Uuid, Value>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub attempt: QuizAttempt,
    pub status: QuizStatus,
    pub score: QuizScore,
    pub grades: Vec<QuestionGrade>,
}
