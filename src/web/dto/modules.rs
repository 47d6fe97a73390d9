use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Module, Resource, Topic};

/// Links a child (module, topic, resource or question) at a position.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AttachBody {
    pub id: Uuid,
    pub position: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ModuleWithTopics {
    #[serde(flatten)]
    pub module: Module,
    pub topics: Vec<Topic>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TopicWithResources {
    #[serde(flatten)]
    pub topic: Topic,
    pub resources: Vec<Resource>,
    /// The caller has a completion marker for this topic.
    pub completed: bool,
}
