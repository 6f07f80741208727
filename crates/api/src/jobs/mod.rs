//! Periodic background tasks.

mod pool_metrics;
mod session_cleanup;

pub use pool_metrics::PoolMetricsJob;
pub use session_cleanup::SessionCleanupJob;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A task run on a fixed interval until shutdown.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    async fn run(&self) -> Result<(), String>;
}

/// Runs registered jobs on their own tokio tasks.
pub struct JobRunner {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Starts `job`. The first run happens one interval after spawning.
    pub fn spawn<J: Job + 'static>(&mut self, job: J) {
        let job: Arc<dyn Job> = Arc::new(job);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.handles.push(tokio::spawn(async move {
            let name = job.name();
            let mut ticker = tokio::time::interval(job.interval());
            ticker.tick().await;
            info!(job = name, every_secs = job.interval().as_secs(), "Job scheduled");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = job.run().await {
                            warn!(job = name, error = %e, "Job run failed");
                        } else {
                            debug!(job = name, "Job run completed");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!(job = name, "Job stopped");
                            break;
                        }
                    }
                }
            }
        }));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signals every job to stop and waits up to `timeout` for them.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);

        let joined = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        if tokio::time::timeout(timeout, joined).await.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "Job shutdown timed out");
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
