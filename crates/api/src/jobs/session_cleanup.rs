//! Session registry cleanup background job.

use chrono::{Duration as ChronoDuration, Utc};
use domain::services::SessionRegistry;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::Job;

/// Drops registry entries whose cookie has expired.
///
/// The login records stay as they are, so an abandoned session keeps
/// showing as active in login history.
pub struct SessionCleanupJob {
    registry: Arc<dyn SessionRegistry>,
    max_age: ChronoDuration,
    every: Duration,
}

impl SessionCleanupJob {
    /// `max_age_secs` is the session cookie lifetime.
    pub fn new(registry: Arc<dyn SessionRegistry>, max_age_secs: i64, every: Duration) -> Self {
        Self {
            registry,
            max_age: ChronoDuration::seconds(max_age_secs),
            every,
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> Result<(), String> {
        let cutoff = Utc::now() - self.max_age;
        let purged = self
            .registry
            .purge_issued_before(cutoff)
            .await
            .map_err(|e| format!("Failed to purge expired sessions: {}", e))?;

        if purged > 0 {
            counter!("sessions_purged_total").increment(purged);
            info!(purged, cutoff = %cutoff, "Purged expired session ids");
        }
        Ok(())
    }
}
