use crate::domain::{CompletionSet, ProgressKind};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub static STATUS_COMPLETED: &str = "Completed";

/// Completion marker for one program, module, resource or topic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct MeasureProgress {
    id: Uuid,
    learner_id: Uuid,
    progress_type: String,
    program_id: Option<Uuid>,
    module_id: Option<Uuid>,
    resource_id: Option<Uuid>,
    topic_id: Option<Uuid>,
    status: String,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MeasureProgressCreate {
    pub learner_id: Uuid,
    pub kind: ProgressKind,
    pub program_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub topic_id: Option<Uuid>,
}

impl MeasureProgressCreate {
    /// The id the marker is about, picked by its kind.
    pub fn target(&self) -> Option<Uuid> {
        match self.kind {
            ProgressKind::Program => self.program_id,
            ProgressKind::Module => self.module_id,
            ProgressKind::Resource => self.resource_id,
            ProgressKind::Topic => self.topic_id,
        }
    }
}

const TARGET_COLUMN: &str = r#"
    CASE progress_type
        WHEN 'program' THEN program_id
        WHEN 'module' THEN module_id
        WHEN 'resource' THEN resource_id
        ELSE topic_id
    END
"#;

impl ResourceTyped for MeasureProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Progress
    }
}

impl MeasureProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> Option<ProgressKind> {
        self.progress_type.parse().ok()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Marking the same target again returns the existing marker.
    pub async fn record(mm: &ModelManager, data: MeasureProgressCreate) -> DatabaseResult<Self> {
        let created: Option<Self> = sqlx::query_as(
            r#"
            INSERT INTO measure_progress
                (id, learner_id, progress_type, program_id, module_id, resource_id, topic_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.learner_id)
        .bind(data.kind.as_str())
        .bind(data.program_id)
        .bind(data.module_id)
        .bind(data.resource_id)
        .bind(data.topic_id)
        .bind(STATUS_COMPLETED)
        .fetch_optional(mm.executor())
        .await?;

        if let Some(created) = created {
            return Ok(created);
        }

        let sql = format!(
            "SELECT * FROM measure_progress WHERE learner_id = $1 AND progress_type = $2 AND {TARGET_COLUMN} = $3"
        );
        let existing = sqlx::query_as(&sql)
            .bind(data.learner_id)
            .bind(data.kind.as_str())
            .bind(data.target())
            .fetch_one(mm.executor())
            .await?;
        Ok(existing)
    }

    /// Every completed id of the learner, folded into sets.
    pub async fn completion_set(mm: &ModelManager, learner_id: Uuid) -> DatabaseResult<CompletionSet> {
        let rows: Vec<(Option<Uuid>, Option<Uuid>, Option<Uuid>, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT program_id, module_id, resource_id, topic_id
            FROM measure_progress
            WHERE learner_id = $1 AND status = $2
            "#,
        )
        .bind(learner_id)
        .bind(STATUS_COMPLETED)
        .fetch_all(mm.executor())
        .await?;

        let mut done = CompletionSet::new();
        for (program, module, resource, topic) in rows {
            done.record(program, module, resource, topic);
        }
        Ok(done)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn target_follows_kind() {
        let (program, topic) = (Uuid::new_v4(), Uuid::new_v4());
        let mut marker = MeasureProgressCreate {
            learner_id: Uuid::new_v4(),
            kind: ProgressKind::Topic,
            program_id: Some(program),
            module_id: None,
            resource_id: None,
            topic_id: Some(topic),
        };
        assert_eq!(marker.target(), Some(topic));

        marker.kind = ProgressKind::Program;
        assert_eq!(marker.target(), Some(program));

        marker.kind = ProgressKind::Module;
        assert_eq!(marker.target(), None);
    }
}
