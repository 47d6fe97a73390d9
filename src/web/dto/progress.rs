use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ProgressKind;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ProgressBody {
    pub program_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub topic_id: Option<Uuid>,
}

impl ProgressBody {
    pub fn kind(&self) -> Option<ProgressKind> {
        ProgressKind::infer(
            self.program_id,
            self.module_id,
            self.resource_id,
            self.topic_id,
        )
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgressRecorded {
    pub id: Uuid,
    pub progress_type: ProgressKind,
    pub status: String,
}
