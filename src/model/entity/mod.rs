mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod program;
pub use program::{Program, ProgramCreate, ProgramFilter, ProgramModuleOutline};

mod module;
pub use module::{Module, ModuleCreate};

mod topic;
pub use topic::{Topic, TopicCreate};

mod resource;
pub use resource::{Resource, ResourceCreate, ResourceKind};

mod enrollment;
pub use enrollment::Enrollment;

mod measure_progress;
pub use measure_progress::{MeasureProgress, MeasureProgressCreate};

mod question;
pub use question::{Question, QuestionCreate, QuestionView};

mod question_paper;
pub use question_paper::{QuestionPaper, QuestionPaperCreate};

mod quiz_assignment;
pub use quiz_assignment::{QuizAssignment, QuizAssignmentCreate};

mod quiz_attempt;
pub use quiz_attempt::QuizAttempt;

mod question_attempt;
pub use question_attempt::QuestionAttempt;

mod password_reset;
pub use password_reset::PasswordReset;

mod webhook_event;
pub use webhook_event::WebhookEvent;
