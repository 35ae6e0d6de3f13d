//! Next-tick deferral.
//!
//! The [`Scheduler`] trait is the host's "run this after the current
//! synchronous callback finishes" capability. [`TickQueue`] is the reference
//! event-loop implementation used by tests and the headless driver.
//!
//! ```text
//!   signal callback ──► schedule_next_tick(task) ──► TickHandle
//!                                                        │ cancel()
//!   host loop ──► TickQueue::run_tick()                  ▼
//!                   runs tasks queued before the call, skipping cancelled
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Cancellation token for one scheduled task.
///
/// Clones share the same flag: the scheduler keeps one clone and checks it
/// right before running the task; the caller keeps the other to cancel.
#[derive(Clone, Default)]
pub struct TickHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TickHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the task. Idempotent; a no-op once the task has run.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Single-shot, zero-delay deferral.
///
/// Implementations must run `task` strictly after the calling callback has
/// returned, and must not run it once its handle has been cancelled.
pub trait Scheduler {
    fn schedule_next_tick(&self, task: Task) -> TickHandle;
}

// ───────────────────────────────────────────────────────────────────
// TickQueue
// ───────────────────────────────────────────────────────────────────

/// Cooperative event queue driven by the host one tick at a time.
#[derive(Default)]
pub struct TickQueue {
    pending: RefCell<VecDeque<(TickHandle, Task)>>,
    ticks: Cell<u64>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick.
    ///
    /// Only tasks queued before this call are eligible; anything scheduled
    /// while the tick runs waits for the next one. Returns the number of
    /// tasks executed (cancelled tasks are discarded, not counted).
    pub fn run_tick(&self) -> usize {
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        self.ticks.set(self.ticks.get() + 1);

        let mut executed = 0;
        for (handle, task) in batch {
            // An earlier task in this batch may have cancelled this one.
            if handle.is_cancelled() {
                continue;
            }
            // Mark as consumed so a late cancel() is a harmless no-op.
            handle.cancel();
            task();
            executed += 1;
        }
        executed
    }

    /// Run ticks until nothing is pending or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.has_live_tasks() {
            self.run_tick();
            ran += 1;
        }
        // Drop leftovers that were cancelled while queued.
        if !self.has_live_tasks() {
            self.pending.borrow_mut().clear();
        }
        ran
    }

    /// Number of queued, non-cancelled tasks.
    pub fn pending(&self) -> usize {
        self.pending
            .borrow()
            .iter()
            .filter(|(handle, _)| !handle.is_cancelled())
            .count()
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks.get()
    }

    fn has_live_tasks(&self) -> bool {
        self.pending() > 0
    }
}

impl Scheduler for TickQueue {
    fn schedule_next_tick(&self, task: Task) -> TickHandle {
        let handle = TickHandle::new();
        self.pending.borrow_mut().push_back((handle.clone(), task));
        handle
    }
}

impl fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.pending())
            .field("ticks", &self.ticks.get())
            .finish()
    }
}
