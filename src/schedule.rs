//! One-shot delayed tasks plus the session counters that make them safe to supersede.
//!
//! Tasks are plain data. Whoever schedules a task captures the governing [`Session`] inside it
//! and compares it against the live counter when the task fires; a mismatch means the sequence
//! that spawned it was cancelled or superseded and the task must do nothing.

use crate::time::Millis;

/// Identity of one run of a timed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Session(u64);

impl Session {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic epoch counter. Advancing it invalidates every session minted before.
#[derive(Debug, Clone, Default)]
pub struct SessionCounter {
    current: u64,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Session {
        Session(self.current)
    }

    pub fn advance(&mut self) -> Session {
        self.current = self.current.wrapping_add(1);
        Session(self.current)
    }

    pub fn is_current(&self, session: Session) -> bool {
        session.0 == self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    id: u64,
    due: Millis,
    task: T,
}

/// Pending one-shot tasks ordered by due time, ties broken by scheduling order.
#[derive(Debug)]
pub struct Timeline<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self { next_id: 0, pending: Vec::new() }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Scheduled { id, due, task });
        TaskHandle(id)
    }

    pub fn schedule_after(&mut self, now: Millis, delay_ms: f64, task: T) -> TaskHandle {
        let delay = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        self.schedule(now + delay, task)
    }

    /// Drops a pending task without running it. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.pending.iter().position(|entry| entry.id == handle.0) {
            Some(index) => {
                self.pending.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<T> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(index, _)| index)?;
        Some(self.pending.swap_remove(index).task)
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.pending.iter().map(|entry| entry.due).min_by(|a, b| a.total_cmp(b))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_counter_invalidates_older_sessions() {
        let mut counter = SessionCounter::new();
        let first = counter.advance();
        assert!(counter.is_current(first));
        let second = counter.advance();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert!(second.value() > first.value());
    }

    #[test]
    fn pop_due_orders_by_time_then_insertion() {
        let mut timeline = Timeline::new();
        timeline.schedule(50.0, "late");
        timeline.schedule(10.0, "early-a");
        timeline.schedule(10.0, "early-b");
        assert_eq!(timeline.pop_due(5.0), None);
        assert_eq!(timeline.pop_due(60.0), Some("early-a"));
        assert_eq!(timeline.pop_due(60.0), Some("early-b"));
        assert_eq!(timeline.pop_due(60.0), Some("late"));
        assert!(timeline.is_empty());
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut timeline = Timeline::new();
        let handle = timeline.schedule_after(0.0, 300.0, 1u8);
        timeline.schedule_after(0.0, 400.0, 2u8);
        assert!(timeline.cancel(handle));
        assert!(!timeline.cancel(handle));
        assert_eq!(timeline.next_due(), Some(400.0));
        assert_eq!(timeline.pop_due(1000.0), Some(2));
        assert_eq!(timeline.pop_due(1000.0), None);
    }

    #[test]
    fn negative_delay_fires_immediately() {
        let mut timeline = Timeline::new();
        timeline.schedule_after(100.0, -25.0, ());
        assert_eq!(timeline.pop_due(100.0), Some(()));
    }
}
