use std::time::{Duration, Instant};

/// Identifies one scheduled callback. Handles are never reused by a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// "Run this after N milliseconds" with a cancellable handle.
///
/// The callback is a typed payload handed back to whoever drains the queue,
/// so the scheduler never has to hold a borrow of the thing being called.
pub trait TimerQueue<T> {
    fn schedule_after(&mut self, delay: Duration, payload: T) -> TimerHandle;

    /// Cancelling a handle that already fired (or never existed) does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug)]
struct Entry<T> {
    handle: TimerHandle,
    deadline: Instant,
    payload: T,
}

/// Deadline-ordered timer queue drained by the event loop.
#[derive(Debug)]
pub struct DeadlineQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for DeadlineQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeadlineQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn schedule_at(&mut self, deadline: Instant, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            deadline,
            payload,
        });
        handle
    }

    /// Returns true if a pending entry was removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Removes the earliest entry due at `now`. Equal deadlines pop in the
    /// order they were scheduled.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.handle))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        Some((entry.handle, entry.payload))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
