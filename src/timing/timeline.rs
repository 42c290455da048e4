//! Declarative cue lists
//!
//! A `Timeline` is an ordered list of `(offset, cue)` pairs. Playing it hands
//! every cue to one `Scheduler`, so stopping the whole sequence is a single
//! `cancel_all` on that scheduler.

use std::time::Duration;

use super::scheduler::{Scheduler, TimerId};

/// A cue and the offset at which it fires, relative to the start of playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue<C> {
    pub at: Duration,
    pub cue: C,
}

/// Ordered list of timed cues
#[derive(Debug, Clone)]
pub struct Timeline<C> {
    cues: Vec<Cue<C>>,
}

impl<C: Clone> Timeline<C> {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self { cues: Vec::new() }
    }

    /// Add a cue at `offset_ms` after playback starts
    ///
    /// Cues are kept sorted by offset; cues added at the same offset keep
    /// their insertion order.
    pub fn at(mut self, offset_ms: u64, cue: C) -> Self {
        let at = Duration::from_millis(offset_ms);
        let idx = self.cues.partition_point(|c| c.at <= at);
        self.cues.insert(idx, Cue { at, cue });
        self
    }

    /// Schedule every cue relative to the scheduler's current clock
    pub fn play(&self, scheduler: &mut Scheduler<C>) -> Vec<TimerId> {
        self.cues
            .iter()
            .map(|c| scheduler.schedule(c.at, c.cue.clone()))
            .collect()
    }

    /// Offset of the last cue
    pub fn duration(&self) -> Duration {
        self.cues.last().map(|c| c.at).unwrap_or(Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Cue<C>> {
        self.cues.iter()
    }
}

impl<C: Clone> Default for Timeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cues_sorted_by_offset() {
        let timeline = Timeline::new().at(500, 'b').at(100, 'a').at(500, 'c');

        let order: Vec<char> = timeline.iter().map(|c| c.cue).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(timeline.duration(), Duration::from_millis(500));
        assert_eq!(timeline.len(), 3);
    }

    #[test]
    fn test_play_is_relative_to_scheduler_clock() {
        let timeline = Timeline::new().at(100, "x").at(200, "y");
        let mut sched = Scheduler::new();
        sched.advance(Duration::from_millis(1_000));

        let ids = timeline.play(&mut sched);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].deadline(), Duration::from_millis(1_100));

        assert_eq!(sched.advance(Duration::from_millis(150)), vec!["x"]);
        assert_eq!(sched.advance(Duration::from_millis(50)), vec!["y"]);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline: Timeline<()> = Timeline::default();
        assert_eq!(timeline.len(), 0);
        assert_eq!(timeline.duration(), Duration::ZERO);
    }
}
