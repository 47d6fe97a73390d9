use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::model::error::DatabaseResult;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DbConnection {
    pool: PgPool, // cloning is cheap, pool is just a wrapper around Arc<>
}

impl DbConnection {
    pub fn connect(connection_str: &str) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(connection_str)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the migrations embedded from `./migrations`.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(&self) -> DatabaseResult<()> {
        tracing::debug!("applying migrations...");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}
