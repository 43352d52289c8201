//! Periodic removal of old terminal jobs.
//!
//! Runs on a fixed interval until the scheduler's master token is
//! cancelled.

use std::sync::Arc;

use crate::scheduler::Inner;

pub(crate) async fn run(inner: Arc<Inner>) {
    let retention = inner.config.retention;
    let Ok(retention_chrono) = chrono::Duration::from_std(retention) else {
        tracing::error!(?retention, "Retention window out of range, sweep disabled");
        return;
    };

    if inner.config.sweep_interval.is_zero() {
        tracing::warn!("Sweep interval is zero, finished jobs are kept until shutdown");
        return;
    }

    tracing::info!(
        retention_secs = retention.as_secs(),
        interval_secs = inner.config.sweep_interval.as_secs(),
        "Job retention sweep started",
    );

    let mut interval = tokio::time::interval(inner.config.sweep_interval);

    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => {
                tracing::info!("Job retention sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = chrono::Utc::now() - retention_chrono;
                let removed = inner.state.write().await.registry.sweep(cutoff);
                if removed > 0 {
                    tracing::info!(removed, "Job retention: purged finished jobs");
                } else {
                    tracing::debug!("Job retention: nothing to purge");
                }
            }
        }
    }
}
