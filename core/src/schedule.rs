//! Cooperative delayed actions advanced by explicit tick deltas.
//!
//! A [`Scheduler`] stores continuations as plain data. Callers advance it once
//! per tick and act on the continuations that came due. Cancelling a task, or
//! clearing the scheduler, removes the continuation so it can never run.

use std::{collections::BTreeMap, time::Duration};

/// Handle identifying a pending task.
///
/// Handles order by due time first and scheduling order second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle {
    due: Duration,
    sequence: u64,
}

impl TaskHandle {
    /// Scheduler time at which the task comes due.
    #[must_use]
    pub const fn due(&self) -> Duration {
        self.due
    }
}

/// Queue of continuations waiting for simulated time to pass.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_sequence: u64,
    pending: BTreeMap<TaskHandle, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_sequence: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Total time the scheduler has been advanced by.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Queues `task` to come due once `delay` has elapsed.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle {
        let handle = TaskHandle {
            due: self.now.saturating_add(delay),
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self.pending.insert(handle, task);
        handle
    }

    /// Removes a pending task, returning its continuation if it had not run yet.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        self.pending.remove(&handle)
    }

    /// Reports whether the task is still waiting.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Time left until the task comes due, if it is still pending.
    #[must_use]
    pub fn remaining(&self, handle: TaskHandle) -> Option<Duration> {
        self.is_pending(handle)
            .then(|| handle.due.saturating_sub(self.now))
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending task without running it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Advances time by `dt` and moves every task that came due into `out`.
    ///
    /// Tasks are emitted in due order; tasks due at the same instant keep the
    /// order they were scheduled in. Tasks scheduled while handling the
    /// output are measured from the advanced time.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<T>) {
        self.now = self.now.saturating_add(dt);
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().due > self.now {
                break;
            }
            out.push(entry.remove());
        }
    }
}
