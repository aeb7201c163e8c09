use std::time::{Duration, Instant};

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Single-threaded queue of delayed tasks, driven by whoever owns the event loop.
///
/// Nothing runs on its own: the owner asks for due tasks with [`TimerQueue::take_due`]
/// and sleeps until [`TimerQueue::next_deadline`] in between.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: Vec<(TimerHandle, Instant, T)>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        TimerQueue {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push((handle, now + delay, task));
        handle
    }

    /// Returns false if the task already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _, _)| *h != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline, _)| *deadline).min()
    }

    /// Remove and return every task whose deadline is at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerHandle, T)> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.1 <= now {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.pending = remaining;

        due.sort_by_key(|(handle, deadline, _)| (*deadline, handle.0));
        due.into_iter().map(|(handle, _, task)| (handle, task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_only_after_delay() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(start, Duration::from_millis(250), "a");

        assert!(timers.take_due(start + Duration::from_millis(249)).is_empty());
        let due = timers.take_due(start + Duration::from_millis(250));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, "a");
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let handle = timers.schedule(start, Duration::from_millis(10), 1);
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(timers.take_due(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_due_tasks_come_back_in_deadline_order() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(start, Duration::from_millis(30), "late");
        timers.schedule(start, Duration::from_millis(10), "early");
        timers.schedule(start, Duration::from_millis(500), "later");

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(10)));
        let due: Vec<_> = timers
            .take_due(start + Duration::from_millis(100))
            .into_iter()
            .map(|(_, task)| task)
            .collect();
        assert_eq!(due, vec!["early", "late"]);
        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_cancel_all_clears_queue() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(start, Duration::ZERO, ());
        timers.schedule(start, Duration::ZERO, ());
        timers.cancel_all();
        assert!(timers.take_due(start).is_empty());
        assert_eq!(timers.next_deadline(), None);
    }
}
