#![forbid(unsafe_code)]

//! One-shot deferred tasks with explicit cancellation tokens.
//!
//! # Invariants
//!
//! - A task runs at most once.
//! - A task whose [`TaskHandle`] was cancelled before its deadline never runs.
//! - Cancelling is idempotent and cancelling a task that already ran is a
//!   no-op.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use web_time::Duration;

/// Deferred task body.
pub type Task = Box<dyn FnOnce()>;

#[derive(Debug, Default)]
struct TaskFlags {
    cancelled: Cell<bool>,
    finished: Cell<bool>,
}

/// Cancellation token for a scheduled task.
///
/// Dropping the handle does NOT cancel the task.
#[derive(Clone)]
pub struct TaskHandle {
    flags: Rc<TaskFlags>,
}

impl TaskHandle {
    /// Create a fresh, pending token. Scheduler implementations hand one
    /// clone to the caller and keep another next to the task.
    pub fn new() -> Self {
        Self {
            flags: Rc::new(TaskFlags::default()),
        }
    }

    /// Prevent the task from running.
    pub fn cancel(&self) {
        self.flags.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.get()
    }

    /// Whether the task already ran.
    pub fn is_finished(&self) -> bool {
        self.flags.finished.get()
    }

    /// Neither cancelled nor finished.
    pub fn is_pending(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }

    /// Mark the task as run. Called by scheduler implementations.
    pub fn mark_finished(&self) {
        self.flags.finished.set(true);
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.flags, &other.flags)
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Host capability that runs a callback once after a delay.
pub trait Scheduler {
    /// Run `task` after `delay` on the host loop unless the returned handle
    /// is cancelled first.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}
