//! Virtual-clock timer queue
//!
//! Each animated component owns one `Scheduler`. Time only moves when the
//! owner advances it, so the same code runs against tokio wall time in the
//! runtime and against hand-fed durations in tests.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle for a scheduled event, used to cancel it before it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

impl TimerId {
    /// Clock reading at which the timer fires
    #[cfg(test)]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Ordered set of pending events keyed by deadline
///
/// Events fire strictly in deadline order; events sharing a deadline fire in
/// the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), E>,
}

impl<E> Scheduler<E> {
    /// Create an empty scheduler with its clock at zero
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current clock reading
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to fire `delay` after the current clock reading
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId {
            deadline: self.now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert((id.deadline, id.seq), event);
        id
    }

    /// Cancel a pending timer, returning its event if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        self.pending.remove(&(id.deadline, id.seq))
    }

    /// Cancel every pending timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Number of timers that have not fired yet
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Time left until the earliest pending timer fires
    pub fn time_until_next(&self) -> Option<Duration> {
        self.pending
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(self.now))
    }

    /// Pop the earliest timer due at or before `until`
    ///
    /// The clock moves to the popped timer's deadline, so anything the caller
    /// schedules in response is measured from the moment the timer fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<E> {
        let (&(deadline, _), _) = self.pending.first_key_value()?;
        if deadline > until {
            return None;
        }
        let ((deadline, _), event) = self.pending.pop_first()?;
        self.now = self.now.max(deadline);
        Some(event)
    }

    /// Move the clock forward to `until` without firing anything
    ///
    /// Call after draining `pop_due`; the clock never runs backwards.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advance by `by`, returning every event that fired in order
    ///
    /// Suitable for owners that never schedule from inside a fired event.
    pub fn advance(&mut self, by: Duration) -> Vec<E> {
        let target = self.now + by;
        let mut fired = Vec::new();
        while let Some(event) = self.pop_due(target) {
            fired.push(event);
        }
        self.settle(target);
        fired
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
