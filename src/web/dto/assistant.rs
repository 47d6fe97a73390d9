use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::integrations::CourseQuery;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub success: bool,
    pub ai_understanding: CourseQuery,
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<Value>,
}
