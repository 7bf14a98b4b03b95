//! Tokio-backed scheduler.

use std::time::Duration;

use banner_engine::{Scheduler, Task, TaskHandle};
use tokio::runtime::Handle;

/// Runs each task on the runtime after a `tokio::time::sleep`.
/// Cancelling aborts the sleeping task.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create a scheduler on an explicit runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a scheduler on the current runtime.
    ///
    /// Panics outside of a tokio runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TaskHandle::new(move || join.abort())
    }
}
