//! Deferred task scheduling.
//!
//! The engine never touches a real clock. Anything that must happen "later"
//! (the reorder quiet period) goes through a [`Scheduler`], so tests can drive
//! time with [`ManualScheduler`] while the service plugs in a runtime timer.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// A callback run once its delay has elapsed.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed. The handle cancels it.
    ///
    /// Implementations must not run `task` before returning.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

/// Cancels a scheduled task.
///
/// Dropping the handle does NOT cancel; the task still runs.
pub struct TaskHandle {
    cancel: Box<dyn FnOnce() + Send + 'static>,
}

impl TaskHandle {
    /// Create a handle that runs `cancel` when [`TaskHandle::cancel`] is called.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancel the task. No effect if it already ran.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    next_id: u64,
    // (due, id) keeps same-deadline tasks in scheduling order
    tasks: BTreeMap<(Duration, u64), Task>,
}

/// Virtual-clock scheduler. Time only moves when [`ManualScheduler::advance`] is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.queue.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().tasks.len()
    }

    /// Move the clock forward by `by`, running every task that falls due, in
    /// deadline order. Tasks scheduled by a running task are picked up if they
    /// fall due within the same window.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.queue.lock().now + by;
        let mut ran = 0;

        loop {
            let task = {
                let mut queue = self.queue.lock();
                let next = queue.tasks.keys().next().copied();
                let due = match next {
                    Some(key) if key.0 <= target => key,
                    _ => {
                        queue.now = target;
                        break;
                    }
                };
                queue.now = due.0;
                queue.tasks.remove(&due)
            };

            // Run outside the lock: tasks may schedule or cancel
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }

        ran
    }

    /// Shorthand for [`ManualScheduler::advance`] in milliseconds.
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let key = {
            let mut queue = self.queue.lock();
            let key = (queue.now + delay, queue.next_id);
            queue.next_id += 1;
            queue.tasks.insert(key, task);
            key
        };

        let queue: Weak<Mutex<ManualQueue>> = Arc::downgrade(&self.queue);
        TaskHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.lock().tasks.remove(&key);
            }
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &queue.now)
            .field("pending", &queue.tasks.len())
            .finish()
    }
}
