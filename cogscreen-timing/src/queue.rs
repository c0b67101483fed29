//! Cancellable delayed tasks.
//!
//! Every `schedule` call hands back a [`TaskHandle`]. Handles are versioned
//! slot keys, so cancelling an already-fired or already-cancelled task is a
//! harmless `false` and a stale handle can never hit a newer task.

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

new_key_type! {
    pub struct TaskHandle;
}

#[derive(Debug)]
struct Pending<T> {
    due: u64,
    seq: u64,
    payload: T,
}

/// Pending tasks keyed by absolute due time. Tasks due at the same instant
/// pop in the order they were scheduled.
#[derive(Debug)]
pub struct TaskQueue<T> {
    tasks: SlotMap<TaskHandle, Pending<T>>,
    next_seq: u64,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            tasks: SlotMap::with_key(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: u64, payload: T) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(Pending { due, seq, payload })
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.tasks.remove(handle).is_some()
    }

    /// Cancels every outstanding task, returning how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        if dropped > 0 {
            trace!("cancelled {} pending task(s)", dropped);
        }
        dropped
    }

    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.earliest().map(|(_, due, _)| due)
    }

    /// Removes and returns the earliest task due at or before `now`,
    /// together with its due time.
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, T)> {
        let (handle, due, _) = self.earliest().filter(|(_, due, _)| *due <= now)?;
        self.tasks.remove(handle).map(|p| (due, p.payload))
    }

    // The queue holds a handful of tasks at most, so a linear scan is enough.
    fn earliest(&self) -> Option<(TaskHandle, u64, u64)> {
        self.tasks
            .iter()
            .map(|(h, p)| (h, p.due, p.seq))
            .min_by_key(|(_, due, seq)| (*due, *seq))
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
