//! Deferred execution of application callbacks
//!
//! Transports call back from their own delivery path, often while holding
//! internal locks. The client never runs application callbacks there: it hands
//! them to a [`Scheduler`], which runs them on a later tick.

use std::fmt;

use tokio::runtime::Handle;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on a later scheduling tick, never inside [`defer`](Scheduler::defer).
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// Queue `task` to run after the current call stack unwinds.
    fn defer(&self, task: Task);
}

/// Spawns each task onto a Tokio runtime.
///
/// The runtime handle is captured up front, so `defer` works from threads that
/// are not part of the runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime of the calling context, if there is one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_defer_does_not_run_inline() {
        let scheduler = TokioScheduler::current().unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let (tx, rx) = tokio::sync::oneshot::channel();

        scheduler.defer(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = tx.send(());
        }));
        assert!(!ran.load(Ordering::SeqCst));

        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_defer_from_foreign_thread() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        std::thread::spawn(move || {
            scheduler.defer(Box::new(move || {
                let _ = tx.send(std::thread::current().name().map(str::to_owned));
            }));
        })
        .join()
        .unwrap();

        assert!(tokio::time::timeout(Duration::from_secs(1), rx).await.is_ok());
    }

    #[test]
    fn test_current_outside_runtime() {
        assert!(TokioScheduler::current().is_none());
    }
}
