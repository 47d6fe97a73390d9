use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct EnrollBody {
    pub program_id: Uuid,
    /// Admins may enroll someone else, learners always enroll themselves.
    pub learner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnrollmentCheckQuery {
    pub program_id: Uuid,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnrollmentCheck {
    pub enrolled: bool,
}
