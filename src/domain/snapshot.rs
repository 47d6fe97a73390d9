use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::progress::CompletionSet;
use crate::domain::scoring;

/// One quiz attempt as the snapshot needs it.
#[derive(Debug, Clone)]
pub struct AttemptSummary {
    pub assignment_id: Uuid,
    pub completed: bool,
    pub score: f64,
    pub started_at: DateTime<Utc>,
    pub time_limit_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AttemptedQuiz {
    pub start: DateTime<Utc>,
    pub score: f64,
}

/// Lookup maps describing everything a learner has enrolled in, finished or
/// attempted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LearnerSnapshot {
    pub enrolled_course_ids: BTreeMap<Uuid, bool>,
    pub completed_programs: BTreeMap<Uuid, bool>,
    pub completed_modules: BTreeMap<Uuid, bool>,
    pub completed_topics: BTreeMap<Uuid, bool>,
    pub completed_resources: BTreeMap<Uuid, bool>,
    /// assignment id -> final score
    pub completed_quizzes: BTreeMap<Uuid, f64>,
    pub attempted_quizzes: BTreeMap<Uuid, AttemptedQuiz>,
}

fn flags<'a>(ids: impl Iterator<Item = &'a Uuid>) -> BTreeMap<Uuid, bool> {
    ids.map(|id| (*id, true)).collect()
}

impl LearnerSnapshot {
    pub fn build<I>(
        enrolled: I,
        done: &CompletionSet,
        attempts: &[AttemptSummary],
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut snapshot = Self {
            enrolled_course_ids: enrolled.into_iter().map(|id| (id, true)).collect(),
            completed_programs: flags(done.programs()),
            completed_modules: flags(done.modules()),
            completed_topics: flags(done.topics()),
            completed_resources: flags(done.resources()),
            ..Default::default()
        };

        for attempt in attempts {
            if attempt.completed {
                snapshot
                    .completed_quizzes
                    .insert(attempt.assignment_id, attempt.score);
                continue;
            }

            snapshot.attempted_quizzes.insert(
                attempt.assignment_id,
                AttemptedQuiz {
                    start: attempt.started_at,
                    score: attempt.score,
                },
            );

            // a timed-out attempt is final with whatever it scored so far
            if scoring::is_expired(attempt.started_at, attempt.time_limit_seconds, now) {
                snapshot
                    .completed_quizzes
                    .insert(attempt.assignment_id, attempt.score);
            }
        }

        snapshot
    }
}
