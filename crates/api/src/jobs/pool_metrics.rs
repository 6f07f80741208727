//! Connection pool gauges.

use sqlx::PgPool;
use std::time::Duration;

use super::Job;

/// Publishes pool size and idle connection gauges.
pub struct PoolMetricsJob {
    pool: PgPool,
    every: Duration,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, every: Duration) -> Self {
        Self { pool, every }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
