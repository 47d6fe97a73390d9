//! Quiz grading and attempt status.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Minimal fraction of points needed to pass a quiz.
pub const PASS_THRESHOLD: f64 = 0.7;

const SLIDER_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Radio,
    Checkbox,
    Text,
    Slider,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Text => "text",
            Self::Slider => "slider",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radio" => Ok(Self::Radio),
            "checkbox" => Ok(Self::Checkbox),
            "text" => Ok(Self::Text),
            "slider" => Ok(Self::Slider),
            other => Err(format!("unknown question type `{other}`")),
        }
    }
}

/// The parts of a pooled question needed for grading.
#[derive(Debug, Clone)]
pub struct GradableQuestion {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub correct_answer: Option<Value>,
    pub points: i32,
}

impl GradableQuestion {
    /// Survey-style questions carry no correct answer and are not graded.
    pub fn is_graded(&self) -> bool {
        !matches!(self.correct_answer, None | Some(Value::Null))
    }

    fn weight(&self) -> i64 {
        if self.is_graded() {
            i64::from(self.points.max(0))
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct QuestionGrade {
    pub question_id: Uuid,
    pub is_correct: bool,
    pub points_earned: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizScore {
    pub earned_points: i64,
    pub total_points: i64,
    pub score: f64,
    pub passed: bool,
}

impl QuizScore {
    pub fn new(earned_points: i64, total_points: i64) -> Self {
        let score = if total_points > 0 {
            earned_points as f64 / total_points as f64
        } else {
            0.0
        };

        Self {
            earned_points,
            total_points,
            score,
            passed: is_passing(score),
        }
    }
}

pub fn is_passing(score: f64) -> bool {
    score >= PASS_THRESHOLD
}

fn as_text_set(value: &Value) -> Option<BTreeSet<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compares a learner answer against the stored correct answer.
pub fn answer_matches(question_type: QuestionType, correct: &Value, answer: &Value) -> bool {
    match question_type {
        QuestionType::Radio => correct == answer,
        QuestionType::Checkbox => match (as_text_set(correct), as_text_set(answer)) {
            (Some(c), Some(a)) => c == a,
            _ => false,
        },
        QuestionType::Text => match (correct.as_str(), answer.as_str()) {
            (Some(c), Some(a)) => c.trim().to_lowercase() == a.trim().to_lowercase(),
            _ => false,
        },
        QuestionType::Slider => match (as_number(correct), as_number(answer)) {
            (Some(c), Some(a)) => (c - a).abs() < SLIDER_EPSILON,
            _ => false,
        },
    }
}

pub fn grade(question: &GradableQuestion, answer: Option<&Value>) -> QuestionGrade {
    let is_correct = match (&question.correct_answer, answer) {
        (Some(correct), Some(answer)) if question.is_graded() => {
            answer_matches(question.question_type, correct, answer)
        }
        _ => false,
    };

    QuestionGrade {
        question_id: question.id,
        is_correct,
        points_earned: if is_correct { question.points.max(0) } else { 0 },
    }
}

/// Grades every question of a paper. Unanswered questions earn nothing but
/// still count toward the total.
pub fn score_paper(
    questions: &[GradableQuestion],
    answers: &HashMap<Uuid, Value>,
) -> (Vec<QuestionGrade>, QuizScore) {
    let mut earned = 0i64;
    let mut total = 0i64;
    let mut grades = Vec::with_capacity(questions.len());

    for question in questions {
        let g = grade(question, answers.get(&question.id));
        earned += i64::from(g.points_earned);
        total += question.weight();
        grades.push(g);
    }

    (grades, QuizScore::new(earned, total))
}

/// Reads `settings.time_limit_seconds` (or a top-level `time_limit_seconds`)
/// from assignment rules. Zero or negative means no limit.
pub fn time_limit_seconds(rules: &Value) -> Option<i64> {
    rules
        .pointer("/settings/time_limit_seconds")
        .or_else(|| rules.get("time_limit_seconds"))
        .and_then(Value::as_i64)
        .filter(|secs| *secs > 0)
}

pub fn is_expired(started_at: DateTime<Utc>, time_limit: Option<i64>, now: DateTime<Utc>) -> bool {
    match time_limit {
        Some(secs) => started_at + Duration::seconds(secs) < now,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    NotStarted,
    InProgress,
    Passed,
    Failed,
}

/// Where a learner stands on one quiz given their attempt, if any.
pub fn quiz_status(
    completed: Option<bool>,
    started_at: DateTime<Utc>,
    score: f64,
    time_limit: Option<i64>,
    now: DateTime<Utc>,
) -> QuizStatus {
    let finished = match completed {
        None => return QuizStatus::NotStarted,
        Some(true) => true,
        Some(false) => is_expired(started_at, time_limit, now),
    };

    match (finished, is_passing(score)) {
        (false, _) => QuizStatus::InProgress,
        (true, true) => QuizStatus::Passed,
        (true, false) => QuizStatus::Failed,
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn question(question_type: QuestionType, correct: Value, points: i32) -> GradableQuestion {
        GradableQuestion {
            id: Uuid::new_v4(),
            question_type,
            correct_answer: Some(correct),
            points,
        }
    }

    #[test]
    fn radio_requires_exact_option() {
        assert!(answer_matches(QuestionType::Radio, &json!("B"), &json!("B")));
        assert!(!answer_matches(QuestionType::Radio, &json!("B"), &json!("b")));
    }

    #[test]
    fn checkbox_ignores_order() {
        let correct = json!(["a", "c"]);
        assert!(answer_matches(QuestionType::Checkbox, &correct, &json!(["c", "a"])));
        assert!(!answer_matches(QuestionType::Checkbox, &correct, &json!(["a"])));
        assert!(!answer_matches(QuestionType::Checkbox, &correct, &json!("a")));
    }

    #[test]
    fn text_is_trimmed_and_case_insensitive() {
        assert!(answer_matches(QuestionType::Text, &json!("Rust"), &json!("  rust ")));
        assert!(!answer_matches(QuestionType::Text, &json!("Rust"), &json!("rusty")));
    }

    #[test]
    fn slider_compares_numbers() {
        assert!(answer_matches(QuestionType::Slider, &json!(5), &json!(5.0)));
        assert!(answer_matches(QuestionType::Slider, &json!(5), &json!("5")));
        assert!(!answer_matches(QuestionType::Slider, &json!(5), &json!(6)));
    }

    #[test]
    fn score_at_threshold_passes() {
        let questions: Vec<_> = (0..10)
            .map(|_| question(QuestionType::Radio, json!("yes"), 1))
            .collect();
        let answers: HashMap<_, _> = questions
            .iter()
            .take(7)
            .map(|q| (q.id, json!("yes")))
            .collect();

        let (grades, score) = score_paper(&questions, &answers);
        assert_eq!(grades.iter().filter(|g| g.is_correct).count(), 7);
        assert_eq!(score.earned_points, 7);
        assert_eq!(score.total_points, 10);
        assert!(score.passed);
    }

    #[test]
    fn score_below_threshold_fails() {
        let heavy = question(QuestionType::Text, json!("borrow checker"), 4);
        let light = question(QuestionType::Radio, json!("A"), 1);
        let answers = HashMap::from([
            (heavy.id, json!("lifetimes")),
            (light.id, json!("A")),
        ]);

        let (_, score) = score_paper(&[heavy, light], &answers);
        assert!((score.score - 0.2).abs() < 1e-9);
        assert!(!score.passed);
    }

    #[test]
    fn points_weight_the_score() {
        let heavy = question(QuestionType::Radio, json!("A"), 3);
        let light = question(QuestionType::Radio, json!("A"), 1);
        let answers = HashMap::from([(heavy.id, json!("A"))]);

        let (_, score) = score_paper(&[heavy, light], &answers);
        assert!((score.score - 0.75).abs() < 1e-9);
        assert!(score.passed);
    }

    #[test]
    fn survey_questions_are_not_graded() {
        let survey = GradableQuestion {
            id: Uuid::new_v4(),
            question_type: QuestionType::Slider,
            correct_answer: None,
            points: 5,
        };
        let graded = question(QuestionType::Radio, json!("A"), 1);
        let answers = HashMap::from([(survey.id, json!(3)), (graded.id, json!("A"))]);

        let (grades, score) = score_paper(&[survey, graded], &answers);
        assert_eq!(score.total_points, 1);
        assert!(score.passed);
        assert!(!grades[0].is_correct);
    }

    #[test]
    fn empty_paper_scores_zero() {
        let (_, score) = score_paper(&[], &HashMap::new());
        assert_eq!(score.score, 0.0);
        assert!(!score.passed);
    }

    #[test]
    fn time_limit_from_rules() {
        assert_eq!(
            time_limit_seconds(&json!({"settings": {"time_limit_seconds": 600}})),
            Some(600)
        );
        assert_eq!(time_limit_seconds(&json!({"time_limit_seconds": 30})), Some(30));
        assert_eq!(
            time_limit_seconds(&json!({"settings": {"time_limit_seconds": 0}})),
            None
        );
        assert_eq!(time_limit_seconds(&json!({})), None);
    }

    #[test]
    fn expired_attempt_counts_as_finished() {
        let now = Utc::now();
        let started = now - Duration::seconds(120);

        assert_eq!(quiz_status(None, started, 0.0, None, now), QuizStatus::NotStarted);
        assert_eq!(
            quiz_status(Some(false), started, 0.9, Some(600), now),
            QuizStatus::InProgress
        );
        assert_eq!(
            quiz_status(Some(false), started, 0.9, Some(60), now),
            QuizStatus::Passed
        );
        assert_eq!(
            quiz_status(Some(false), started, 0.5, Some(60), now),
            QuizStatus::Failed
        );
        assert_eq!(
            quiz_status(Some(true), started, 0.7, None, now),
            QuizStatus::Passed
        );
    }
}
