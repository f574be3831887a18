//! Background idle-session reaper
//!
//! A cancellable periodic task: sleep `cleanup_interval`, evict idle
//! sessions, log non-zero results, repeat. A failing iteration is logged and
//! never stops future iterations. Shutdown is cooperative with a bounded
//! wait.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// How long `ReaperHandle::shutdown` waits for the task to exit.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for the background reaper task.
pub struct ReaperHandle {
    shutdown_tx: tokio::sync::mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signal the reaper to stop and wait for it, bounded by
    /// [`SHUTDOWN_TIMEOUT`].
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.join).await.is_err() {
            warn!("reaper did not stop within shutdown timeout");
        }
    }
}

/// Spawn the reaper. `cleanup` runs once per interval; it returns the number
/// of sessions evicted or an error message for that iteration.
pub fn spawn_reaper<F>(interval: Duration, cleanup: F) -> ReaperHandle
where
    F: Fn() -> Result<usize, String> + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    let join = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "starting session reaper");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("session reaper shutting down");
                    break;
                }
                _ = sleep(interval) => {
                    match cleanup() {
                        Ok(0) => {}
                        Ok(evicted) => {
                            info!(evicted, "reaper evicted idle sessions");
                        }
                        Err(e) => {
                            // Keep looping: one bad iteration must not halt cleanup.
                            error!(error = %e, "reaper iteration failed");
                        }
                    }
                }
            }
        }
    });

    ReaperHandle { shutdown_tx, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reaper_runs_periodically() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = spawn_reaper(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        });

        sleep(Duration::from_millis(60)).await;
        handle.shutdown().await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_iteration_failure_does_not_stop_reaper() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = spawn_reaper(Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err("transient failure".to_string())
            } else {
                Ok(0)
            }
        });

        sleep(Duration::from_millis(60)).await;
        handle.shutdown().await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_iterations() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = spawn_reaper(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        });

        sleep(Duration::from_millis(30)).await;
        handle.shutdown().await;
        let after_shutdown = runs.load(Ordering::SeqCst);
        sleep(Duration::from_millis(40)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }
}
