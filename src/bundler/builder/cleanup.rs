//! Session cleanup registry.
//!
//! Resources that must not outlive a packaging run (the ephemeral keychain)
//! register a teardown action here. The orchestrator drains the registry
//! once the run settles, whichever branch failed.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

type CleanupFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type CleanupTask = Box<dyn FnOnce() -> CleanupFuture + Send>;

/// Append-only list of teardown actions, each run exactly once.
///
/// Cloning yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct CleanupRegistry {
    tasks: Arc<Mutex<Vec<(String, CleanupTask)>>>,
}

impl std::fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("pending", &self.pending())
            .finish()
    }
}

impl CleanupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a teardown action.
    pub fn register<F, Fut>(&self, name: impl Into<String>, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task: CleanupTask = Box::new(move || Box::pin(task()));
        self.lock().push((name.into(), task));
    }

    /// Number of actions not yet run.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Runs every registered action in reverse registration order.
    ///
    /// The registry is drained first, so a second call is a no-op.
    pub async fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.lock());
        for (name, task) in tasks.into_iter().rev() {
            log::debug!("Running cleanup: {}", name);
            task().await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, CleanupTask)>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_each_task_once() {
        let registry = CleanupRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        registry.register("count", move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(registry.pending(), 1);

        registry.run_all().await;
        registry.run_all().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test]
    async fn runs_in_reverse_order() {
        let registry = CleanupRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            registry.register(format!("task {i}"), move || async move {
                order.lock().unwrap().push(i);
            });
        }

        registry.run_all().await;
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn clones_share_tasks() {
        let registry = CleanupRegistry::new();
        let handle = registry.clone();
        handle.register("noop", || async {});
        assert_eq!(registry.pending(), 1);
    }
}
