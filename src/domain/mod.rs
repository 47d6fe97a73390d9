//! Request-independent learning rules: completion folding, quiz grading and
//! the learner snapshot.

pub mod progress;
pub use progress::{
    CompletionSet, ModuleNode, ModuleProgress, ProgramProgress, ProgramTree, ProgressKind,
    program_progress,
};

pub mod scoring;
pub use scoring::{
    GradableQuestion, PASS_THRESHOLD, QuestionGrade, QuestionType, QuizScore, QuizStatus,
};

pub mod snapshot;
pub use snapshot::{AttemptSummary, AttemptedQuiz, LearnerSnapshot};
