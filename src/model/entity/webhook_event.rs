use sqlx::PgExecutor;

use crate::model::error::DatabaseResult;

/// Ids of processed gateway deliveries.
pub struct WebhookEvent;

impl WebhookEvent {
    /// Remembers the event. Returns `false` when it was already recorded.
    pub async fn record<'e, E: PgExecutor<'e>>(
        executor: E,
        event_id: &str,
        event_type: &str,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type)
            VALUES ($1, $2)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
