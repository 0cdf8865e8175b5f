//! Background worker lifecycle for the batching front.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::error;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A handle for managing a background worker task that drains a request
/// queue.
///
/// The task receives a running flag and a notifier. It should keep looping
/// while the flag is set and wake up whenever the notifier fires. Dropping
/// the handle clears the flag and wakes the task so it can exit.
///
/// # Example
///
/// ```ignore
/// let worker = BatchWorkerHandle::new(|running, notifier| {
///     tokio::spawn(async move {
///         while running.load(Ordering::SeqCst) {
///             notifier.notified().await;
///             // drain the queue
///         }
///     })
/// });
///
/// worker.notify();
/// ```
pub struct BatchWorkerHandle {
    running: Arc<AtomicBool>,

    /// `None` once shutdown has started
    handle: Option<JoinHandle<()>>,

    notifier: Arc<Notify>,
}

impl BatchWorkerHandle {
    /// Spawn the worker through `task` and keep its handle.
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>, Arc<Notify>) -> JoinHandle<()> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let notifier = Arc::new(Notify::new());
        let handle = task(running.clone(), notifier.clone());

        Self {
            running,
            handle: Some(handle),
            notifier,
        }
    }

    /// Wake the worker. A notification sent while the worker is busy is kept
    /// until its next wait.
    pub fn notify(&self) {
        self.notifier.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the worker after its current batch.
    ///
    /// Does not block. If a runtime is available the task is awaited in the
    /// background so a panic inside it gets logged.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();

        if let Some(handle) = self.handle.take() {
            if let Ok(runtime) = Handle::try_current() {
                runtime.spawn(async move {
                    if let Err(e) = handle.await {
                        if e.is_panic() {
                            error!("Batch worker panicked: {}", e);
                        }
                    }
                });
            }
        }
    }
}

impl Drop for BatchWorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::time;

    use super::*;

    fn counting_worker(count: Arc<AtomicUsize>, stopped: Arc<AtomicBool>) -> BatchWorkerHandle {
        BatchWorkerHandle::new(move |running, notifier| {
            tokio::spawn(async move {
                while running.load(Ordering::SeqCst) {
                    notifier.notified().await;
                    count.fetch_add(1, Ordering::SeqCst);
                }
                stopped.store(true, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn test_worker_starts_running() {
        let worker = counting_worker(Default::default(), Default::default());
        assert!(worker.is_running());
    }

    #[tokio::test]
    async fn test_worker_notifies() {
        let count = Arc::new(AtomicUsize::new(0));
        let worker = counting_worker(count.clone(), Default::default());

        time::sleep(Duration::from_millis(50)).await;
        worker.notify();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        worker.notify();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_notification_before_wait_is_not_lost() {
        let count = Arc::new(AtomicUsize::new(0));
        // notified before the spawned task ever polls
        let worker = counting_worker(count.clone(), Default::default());
        worker.notify();

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_worker_shutdown() {
        let stopped = Arc::new(AtomicBool::new(false));
        let mut worker = counting_worker(Default::default(), stopped.clone());

        worker.notify();
        time::sleep(Duration::from_millis(50)).await;
        worker.shutdown();
        time::sleep(Duration::from_millis(100)).await;

        assert!(!worker.is_running());
        assert!(stopped.load(Ordering::SeqCst));
        assert!(worker.handle.is_none());
    }

    #[tokio::test]
    async fn test_worker_drop_triggers_shutdown() {
        let stopped = Arc::new(AtomicBool::new(false));
        {
            let worker = counting_worker(Default::default(), stopped.clone());
            worker.notify();
            time::sleep(Duration::from_millis(50)).await;
        }
        time::sleep(Duration::from_millis(100)).await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut worker = counting_worker(Default::default(), Default::default());
        worker.shutdown();
        worker.shutdown();
        assert!(!worker.is_running());
    }
}
